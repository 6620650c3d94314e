use url::form_urlencoded::byte_serialize;

use crate::feed::sidebar::truncate;

const SHARE_TEXT_CHARS: usize = 80;

/// Outbound share targets for one post.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareLinks {
    pub post_url: String,
    pub whatsapp: String,
    pub facebook: String,
    pub twitter: String,
    pub telegram: String,
}

fn encode(s: &str) -> String {
    byte_serialize(s.as_bytes()).collect()
}

pub fn share_text(content: &str) -> String {
    format!("شاهد هذه الخاطرة: \"{}\"", truncate(content, SHARE_TEXT_CHARS))
}

impl ShareLinks {
    pub fn new(site_url: &str, post_id: &str, content: &str) -> Self {
        let post_url = format!("{}/post/{}", site_url.trim_end_matches('/'), post_id);
        let text = share_text(content);
        let url = encode(&post_url);

        Self {
            whatsapp: format!("https://wa.me/?text={}", encode(&format!("{text} {post_url}"))),
            facebook: format!("https://www.facebook.com/sharer/sharer.php?u={url}"),
            twitter: format!("https://twitter.com/intent/tweet?text={}&url={url}", encode(&text)),
            telegram: format!("https://t.me/share/url?url={url}&text={}", encode(&text)),
            post_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_point_at_the_post() {
        let links = ShareLinks::new("https://khateraty.example/", "abc", "hello world");
        assert_eq!(links.post_url, "https://khateraty.example/post/abc");
        assert_eq!(
            links.facebook,
            "https://www.facebook.com/sharer/sharer.php?u=https%3A%2F%2Fkhateraty.example%2Fpost%2Fabc"
        );
        assert!(links.whatsapp.starts_with("https://wa.me/?text="));
        assert!(links.whatsapp.contains("hello+world"));
        assert!(links.telegram.contains("url=https%3A%2F%2Fkhateraty.example%2Fpost%2Fabc"));
        assert!(links.twitter.starts_with("https://twitter.com/intent/tweet?text="));
    }

    #[test]
    fn share_text_is_capped() {
        let text = share_text(&"ن".repeat(200));
        assert!(text.contains(&"ن".repeat(80)));
        assert!(!text.contains(&"ن".repeat(81)));
        assert!(text.contains("..."));
        assert_eq!(share_text("قصير"), "شاهد هذه الخاطرة: \"قصير\"");
    }
}
