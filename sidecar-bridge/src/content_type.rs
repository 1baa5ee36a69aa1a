use crate::consts::JSON_CONTENT_TYPE;

/// Whether a raw `Content-Type` value names JSON.
///
/// Parameters such as `charset` are ignored; the media type itself must be
/// exactly `application/json`, matched case-sensitively with no leading
/// whitespace.
pub fn is_json_content_type(content_type: &str) -> bool {
    let essence = match content_type.split_once(';') {
        Some((essence, _params)) => essence,
        None => content_type,
    };
    essence.trim_end() == JSON_CONTENT_TYPE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_content_types() {
        let cases = [
            ("application/json", true),
            ("text/plains; charset=utf-8", false),
            ("application/json; charset=utf-8", true),
            ("application/json;charset=utf-8", true),
            ("application/json ; charset=utf-8", true),
            ("Application/JSON", false),
            (" application/json", false),
            ("application/jsonp", false),
            ("application/problem+json", false),
            ("", false),
        ];

        for (input, expected) in cases {
            assert_eq!(is_json_content_type(input), expected, "{input:?}");
        }
    }
}
