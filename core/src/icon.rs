/// Glyph used when an extension has no mapping.
pub const DEFAULT_ICON: &str = "📄";

const ICONS: &[(&str, &str)] = &[
    ("exe", "📦"), ("pdf", "📄"), ("doc", "📄"), ("docx", "📄"),
    ("xls", "📊"), ("xlsx", "📊"), ("ppt", "📋"), ("pptx", "📋"),
    ("txt", "📝"), ("md", "📝"), ("jpg", "🖼️"), ("jpeg", "🖼️"),
    ("png", "🖼️"), ("gif", "🖼️"), ("svg", "🖼️"), ("mp4", "🎬"),
    ("mp3", "🎵"), ("wav", "🎵"), ("zip", "📦"), ("rar", "📦"),
    ("7z", "📦"), ("json", "🔧"), ("js", "🔧"), ("ts", "🔧"),
    ("html", "🌐"), ("css", "🎨"), ("py", "🐍"), ("java", "☕"),
    ("c", "📟"), ("cpp", "📟"), ("h", "📟"), ("hpp", "📟"),
    ("go", "🐹"), ("rs", "🦀"), ("php", "🐘"), ("rb", "🐰"),
    ("swift", "🍎"), ("kt", "🤖"), ("xml", "📰"), ("yml", "📋"),
    ("yaml", "📋"), ("toml", "📋"),
];

/// Lowercased text after the last `.` of a file name, if any.
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Returns `true` when the extension has a dedicated glyph.
pub fn is_known_extension(ext: &str) -> bool {
    ICONS.iter().any(|(known, _)| *known == ext)
}

/// Maps a file name to a display glyph by its extension.
pub fn icon_for(name: &str) -> &'static str {
    extension_of(name)
        .and_then(|ext| ICONS.iter().find(|(known, _)| *known == ext))
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}
