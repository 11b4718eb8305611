// ABOUTME: Translation between A2A protocol parts and agent content parts.
// ABOUTME: Total over text, inline bytes and URI references; anything else is a ConversionError.

use a2adk_agent::content::{Blob, FileData, Part as AgentPart};
use a2adk_protocol::{FileContent, FileWithBytes, FileWithUri, Part as ProtocolPart};
use base64::{engine::general_purpose::STANDARD, Engine as _};

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Unsupported part type: {0}")]
    UnsupportedPart(&'static str),
    #[error("File bytes are not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Convert one inbound protocol part into an agent part
pub fn to_agent_part(part: &ProtocolPart) -> Result<AgentPart, ConversionError> {
    match part {
        ProtocolPart::Text { text, .. } => Ok(AgentPart::Text(text.clone())),
        ProtocolPart::File {
            file: FileContent::Uri(file),
            ..
        } => Ok(AgentPart::FileData(FileData {
            file_uri: file.uri.clone(),
            mime_type: file.mime_type.clone(),
        })),
        ProtocolPart::File {
            file: FileContent::Bytes(file),
            ..
        } => Ok(AgentPart::InlineData(Blob {
            data: STANDARD.decode(file.bytes.as_bytes())?,
            mime_type: file.mime_type.clone(),
        })),
        ProtocolPart::Data { .. } => Err(ConversionError::UnsupportedPart("data")),
    }
}

/// Convert every part; the first unsupported part fails the whole message
pub fn to_agent_parts(parts: &[ProtocolPart]) -> Result<Vec<AgentPart>, ConversionError> {
    parts.iter().map(to_agent_part).collect()
}

/// Convert one agent part into a protocol part
pub fn to_protocol_part(part: &AgentPart) -> Result<ProtocolPart, ConversionError> {
    match part {
        AgentPart::Text(text) => Ok(ProtocolPart::text(text.clone())),
        AgentPart::FileData(file) => Ok(ProtocolPart::File {
            file: FileContent::Uri(FileWithUri {
                uri: file.file_uri.clone(),
                mime_type: file.mime_type.clone(),
                name: None,
            }),
            metadata: None,
        }),
        AgentPart::InlineData(blob) => Ok(ProtocolPart::File {
            file: FileContent::Bytes(FileWithBytes {
                bytes: STANDARD.encode(&blob.data),
                mime_type: blob.mime_type.clone(),
                name: None,
            }),
            metadata: None,
        }),
        AgentPart::FunctionCall(_) => Err(ConversionError::UnsupportedPart("function_call")),
        AgentPart::FunctionResponse(_) => {
            Err(ConversionError::UnsupportedPart("function_response"))
        }
    }
}

/// Convert the user-visible parts of an agent event. Empty text and
/// function parts carry nothing to show and are left out.
pub fn to_protocol_parts(parts: &[AgentPart]) -> Result<Vec<ProtocolPart>, ConversionError> {
    parts
        .iter()
        .filter(|p| p.has_payload())
        .map(to_protocol_part)
        .collect()
}
