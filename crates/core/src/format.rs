use crate::{
    tools::AI_TOOLS,
    types::{AnalysisResult, VideoRecord},
};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Compact engagement count, e.g. 1.5M or 342K
pub fn format_count(count: Option<u64>) -> String {
    fn scaled(n: u64, unit: u64, suffix: &str) -> String {
        let value = format!("{:.1}", n as f64 / unit as f64);
        format!("{}{}", value.trim_end_matches(".0"), suffix)
    }

    // thresholds sit where one decimal place rounds up into the next unit
    match count {
        None => "Unknown".to_string(),
        Some(n) if n >= 999_950 => scaled(n, 1_000_000, "M"),
        Some(n) if n >= 1_000 => scaled(n, 1_000, "K"),
        Some(n) => n.to_string(),
    }
}

/// Format the source metadata and analysis as human-readable markdown
pub fn format_result_readable(video: &VideoRecord, analysis: &AnalysisResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", video.title));
    output.push_str(&format!(
        "**Author:** @{} | **Duration:** {} | **Plays:** {} | **Likes:** {}\n\n",
        video.author,
        format_timestamp(video.duration_seconds),
        format_count(video.play_count),
        format_count(video.like_count)
    ));
    output.push_str(&format!("**Video:** {}\n\n", video.video_url));

    if video.is_demo {
        output.push_str(
            "> Using demo data. Real extraction may be blocked by TikTok's anti-bot protection.\n\n",
        );
    }

    output.push_str("## AI Recreation Prompt\n\n");
    output.push_str(&analysis.prompt);
    output.push_str("\n\n");

    output.push_str("## Technical Details\n\n");
    output.push_str(&analysis.technical_details);
    output.push_str("\n\n");

    output.push_str("## Viral Factors\n\n");
    for (i, factor) in analysis.viral_factors.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, factor));
    }
    output.push('\n');

    output.push_str("## Generate Video With\n\n");
    for tool in AI_TOOLS {
        let free = if tool.is_free { " (free tier)" } else { "" };
        output.push_str(&format!(
            "• {}{} - {}\n  {}\n",
            tool.name, free, tool.description, tool.url
        ));
    }

    output
}
