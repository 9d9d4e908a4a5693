use ratatui::style::Color;

pub struct Theme {
    pub name: &'static str,
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub border: Color,
    pub highlight: Color,
    pub accent: Color,
    pub assistant: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

const fn hex(rgb: u32) -> Color {
    Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
}

pub const THEMES: &[Theme] = &[
    Theme {
        name: "Tokyo Night",
        bg: hex(0x1a1b26),
        fg: hex(0xc0caf5),
        muted: hex(0x565f89),
        border: hex(0x414868),
        highlight: hex(0x364a82),
        accent: hex(0x7aa2f7),
        assistant: hex(0xbb9af7),
        success: hex(0x9ece6a),
        warning: hex(0xe0af68),
        error: hex(0xf7768e),
    },
    Theme {
        name: "Catppuccin Mocha",
        bg: hex(0x1e1e2e),
        fg: hex(0xcdd6f4),
        muted: hex(0x6c7086),
        border: hex(0x45475a),
        highlight: hex(0x313244),
        accent: hex(0x89b4fa),
        assistant: hex(0xcba6f7),
        success: hex(0xa6e3a1),
        warning: hex(0xf9e2af),
        error: hex(0xf38ba8),
    },
    Theme {
        name: "Gruvbox Dark",
        bg: hex(0x282828),
        fg: hex(0xebdbb2),
        muted: hex(0x928374),
        border: hex(0x504945),
        highlight: hex(0x3c3836),
        accent: hex(0x83a598),
        assistant: hex(0xd3869b),
        success: hex(0xb8bb26),
        warning: hex(0xfabd2f),
        error: hex(0xfb4934),
    },
];
