use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

use crate::api::{Agent, ApiClient};

fn status_color(status: &str) -> ColoredString {
    match status {
        "RUNNING" => status.green(),
        "TERMINATED" => status.red(),
        _ => status.dimmed(),
    }
}

/// Render a timestamp as an age relative to now
fn age(timestamp: &str) -> String {
    let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) else {
        return "-".to_string();
    };
    let seconds = (Utc::now() - parsed.with_timezone(&Utc)).num_seconds().max(0) as u64;

    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else if mins > 0 {
        format!("{}m", mins)
    } else {
        format!("{}s", seconds)
    }
}

/// List agents
pub async fn list(api_url: Option<String>) -> Result<()> {
    let api = ApiClient::from_config(api_url)?;
    let agents: Vec<Agent> = api.get("/agents").await?;

    if agents.is_empty() {
        println!("{}", "No agents found.".dimmed());
        return Ok(());
    }

    println!("{}", "Agents".bold());
    println!("{}", "─".repeat(60));
    println!(
        "  {:<8} {:<12} {:>10} {:>12}",
        "ID".dimmed(),
        "STATUS".dimmed(),
        "AGE".dimmed(),
        "TERMINATED".dimmed(),
    );
    println!("{}", "─".repeat(60));

    for agent in &agents {
        let terminated = agent
            .terminated_at
            .as_deref()
            .map(age)
            .unwrap_or_else(|| "-".to_string());

        println!(
            "  {:<8} {:<12} {:>10} {:>12}",
            agent.id,
            status_color(&agent.status),
            age(&agent.created_at),
            terminated,
        );
    }

    println!();
    println!("{} agent(s)", agents.len());

    Ok(())
}

/// Show one agent
pub async fn get(api_url: Option<String>, id: i64) -> Result<()> {
    let api = ApiClient::from_config(api_url)?;
    let agent: Agent = api.get(&format!("/agents/{}", id)).await?;

    println!("{} {}", "Agent".bold(), agent.id.to_string().bold());
    println!("  Status:     {}", status_color(&agent.status));
    println!("  Created:    {}", agent.created_at);
    if let Some(terminated_at) = &agent.terminated_at {
        println!("  Terminated: {}", terminated_at);
    }

    Ok(())
}

/// Delete an agent's record
pub async fn delete(api_url: Option<String>, id: i64) -> Result<()> {
    let api = ApiClient::from_config(api_url)?;
    api.delete(&format!("/agents/{}", id)).await?;

    println!("{} Agent {} deleted", "✓".green().bold(), id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_of_invalid_timestamp() {
        assert_eq!(age("yesterday"), "-");
    }

    #[test]
    fn test_age_formatting() {
        let created = (Utc::now() - chrono::Duration::seconds(3 * 3600 + 120)).to_rfc3339();
        assert_eq!(age(&created), "3h 2m");
    }
}
