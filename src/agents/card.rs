// ABOUTME: Agent card advertised at the well-known path for the birthday planner.
// ABOUTME: The card URL points back at this server's JSON-RPC endpoint.

use a2adk_protocol::{AgentCapabilities, AgentCard, AgentSkill};

pub fn agent_card(host: &str, port: u16) -> AgentCard {
    let skill = AgentSkill {
        id: "plan_parties".to_string(),
        name: "Plan a Birthday Party".to_string(),
        description: "Plan a birthday party, including times, activities, and themes.".to_string(),
        tags: vec!["event-planning".to_string()],
        examples: vec![
            "My son is turning 3 on August 2nd! What should I do for his party?".to_string(),
            "Can you add the details to my calendar?".to_string(),
        ],
    };

    AgentCard {
        name: "Birthday Planner".to_string(),
        description: "I can help you plan fun birthday parties.".to_string(),
        url: format!("http://{}:{}/", host, port),
        version: "1.0.0".to_string(),
        protocol_version: "0.2.5".to_string(),
        capabilities: AgentCapabilities {
            streaming: true,
            ..Default::default()
        },
        default_input_modes: vec!["text".to_string()],
        default_output_modes: vec!["text".to_string()],
        skills: vec![skill],
    }
}
