use rand::Rng;

const SUFFIX_LEN: usize = 8;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const DEFAULT_EXTENSION: &str = "jpg";

/// File extension for an image content type; `jpg` when unknown.
pub fn extension_for(content_type: &str) -> &'static str {
    let subtype = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match subtype.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/avif" => "avif",
        "image/bmp" => "bmp",
        _ => DEFAULT_EXTENSION,
    }
}

/// Object file name: `<unix-millis>-<8 lowercase alphanumerics>.<ext>`.
pub fn media_file_name<R: Rng>(now_ms: i64, content_type: &str, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.gen_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();
    format!("{now_ms}-{suffix}.{}", extension_for(content_type))
}
