use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToolLink {
    pub id: &'static str,
    pub name: &'static str,
    pub url: &'static str,
    pub description: &'static str,
    pub is_free: bool,
}

/// Video generators the recreation prompt is written for.
pub const AI_TOOLS: &[ToolLink] = &[
    ToolLink {
        id: "zeroscope",
        name: "Zeroscope V2",
        url: "https://replicate.com/cerspense/zeroscope_v2_576w",
        description: "Open-source model, great for surreal/abstract clips. Free via Replicate trial.",
        is_free: true,
    },
    ToolLink {
        id: "runway",
        name: "Runway Gen-2/3",
        url: "https://runwayml.com",
        description: "Industry standard for high-quality video generation.",
        is_free: false,
    },
    ToolLink {
        id: "pika",
        name: "Pika Labs",
        url: "https://pika.art",
        description: "Excellent for animation and style transfer.",
        is_free: true,
    },
    ToolLink {
        id: "luma",
        name: "Luma Dream Machine",
        url: "https://lumalabs.ai/dream-machine",
        description: "High fidelity, realistic motion generation.",
        is_free: true,
    },
];
