use std::time::Duration;

/// Length of a channel ID: `UC` followed by 22 URL-safe base64 characters
const CHANNEL_ID_LEN: usize = 24;

/// Check that a string has the shape of a YouTube channel ID
pub fn is_valid_channel_id(channel_id: &str) -> bool {
    channel_id.len() == CHANNEL_ID_LEN
        && channel_id.starts_with("UC")
        && channel_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp_path: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp_path).await {
        missing.push(format!("{} - required for caption retrieval", yt_dlp_path));
    }

    missing
}

/// Check if a command is available in PATH
async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_channel_id() {
        assert!(is_valid_channel_id("UC_x5XG1OV2P6uZZ5FSM9Ttw"));
        assert!(is_valid_channel_id("UCBR8-60-B28hp2BmDPdntcQ"));
        assert!(!is_valid_channel_id("UC_x5XG1OV2P6uZZ5FSM9Tt"));
        assert!(!is_valid_channel_id("UU_x5XG1OV2P6uZZ5FSM9Ttw"));
        assert!(!is_valid_channel_id("UC_x5XG1OV2P6uZZ5FSM9T w"));
        assert!(!is_valid_channel_id("@GoogleDevelopers"));
        assert!(!is_valid_channel_id(""));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let missing = check_dependencies("definitely-not-a-real-binary-7f3a").await;
        assert_eq!(missing.len(), 1);
        assert!(missing[0].contains("caption retrieval"));
    }
}
