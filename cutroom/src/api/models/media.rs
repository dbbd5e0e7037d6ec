//! Media reference fields shared by the content request types.
//!
//! Requests name media with a `<field>Url` and an optional `<field>Key`, exactly as returned
//! by the presign endpoint. On updates the URL is tri-state: absent keeps the stored pair,
//! `null` (or an empty string) clears it, a value replaces it.

use url::Url;
use validator::ValidationError;

use crate::db::models::MediaUpdate;
use crate::errors::{Error, FieldError, Result};
use crate::storage::MediaField;

/// Lowercase ASCII letters, digits and single dashes, e.g. `brand-film-2024`.
pub fn validate_slug(slug: &str) -> std::result::Result<(), ValidationError> {
    let well_formed = !slug.is_empty()
        && slug.len() <= 200
        && slug.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--");

    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("slug").with_message("slug may only contain lowercase letters, digits and single dashes".into()))
    }
}

/// Derive a slug from free text: `"Brand Film (2024)"` -> `"brand-film-2024"`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_end_matches('-').len();
    slug.truncate(trimmed);
    slug
}

/// Turn a list of field problems into a validation error, if there are any.
pub fn ensure_valid(fields: Vec<FieldError>) -> Result<()> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation { fields })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn check_url(field: MediaField, url: &str, fields: &mut Vec<FieldError>) {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some() => {}
        _ => fields.push(FieldError::new(
            field.url_field(),
            format!("{} must be an absolute http(s) URL", field.url_field()),
        )),
    }
}

fn check_key(field: MediaField, key: &str, fields: &mut Vec<FieldError>) {
    if key.starts_with('/') || key.split('/').any(|segment| segment.is_empty() || segment == "..") {
        fields.push(FieldError::new(
            field.key_field(),
            format!("{} must be a relative object key", field.key_field()),
        ));
    }
}

fn set(field: MediaField, url: String, key: Option<String>, fields: &mut Vec<FieldError>) -> MediaUpdate {
    check_url(field, &url, fields);
    if let Some(key) = &key {
        check_key(field, key, fields);
    }
    MediaUpdate::set(url, key)
}

fn orphan_key(field: MediaField, fields: &mut Vec<FieldError>) {
    fields.push(FieldError::new(
        field.key_field(),
        format!("{} requires {}", field.key_field(), field.url_field()),
    ));
}

/// Media for a new record. Missing URL means no media.
pub fn media_for_create(field: MediaField, url: Option<String>, key: Option<String>, fields: &mut Vec<FieldError>) -> MediaUpdate {
    match (non_empty(url), non_empty(key)) {
        (Some(url), key) => set(field, url, key, fields),
        (None, Some(_)) => {
            orphan_key(field, fields);
            MediaUpdate::clear()
        }
        (None, None) => MediaUpdate::clear(),
    }
}

/// Media change for an existing record. `None` leaves the stored pair untouched.
pub fn media_for_update(
    field: MediaField,
    url: Option<Option<String>>,
    key: Option<String>,
    fields: &mut Vec<FieldError>,
) -> Option<MediaUpdate> {
    match (url, non_empty(key)) {
        (None, None) => None,
        (None, Some(_)) => {
            orphan_key(field, fields);
            None
        }
        (Some(url), key) => match non_empty(url) {
            Some(url) => Some(set(field, url, key, fields)),
            None if key.is_some() => {
                orphan_key(field, fields);
                None
            }
            None => Some(MediaUpdate::clear()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Brand Film (2024)"), "brand-film-2024");
        assert_eq!(slugify("  Senior Colorist!  "), "senior-colorist");
        assert_eq!(slugify("Über cut"), "ber-cut");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("brand-film-2024").is_ok());
        for bad in ["", "Brand", "a--b", "-a", "a-", "a b", "a_b"] {
            assert!(validate_slug(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_create_media() {
        let mut fields = Vec::new();
        let media = media_for_create(
            MediaField::Video,
            Some("https://media.example.com/portfolio/1-a.mp4".to_string()),
            Some("portfolio/1-a.mp4".to_string()),
            &mut fields,
        );
        assert!(fields.is_empty());
        assert_eq!(media.key.as_deref(), Some("portfolio/1-a.mp4"));

        // Empty strings from forms mean "no media"
        let media = media_for_create(MediaField::Video, Some(String::new()), None, &mut fields);
        assert_eq!(media, MediaUpdate::clear());
        assert!(fields.is_empty());
    }

    #[test]
    fn test_create_media_rejects_bad_input() {
        let mut fields = Vec::new();
        media_for_create(MediaField::Thumbnail, None, Some("thumbnails/1-a.jpg".to_string()), &mut fields);
        media_for_create(MediaField::Video, Some("not a url".to_string()), Some("../etc".to_string()), &mut fields);

        let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["thumbnailKey", "videoUrl", "videoKey"]);
        assert_eq!(fields[0].message, "thumbnailKey requires thumbnailUrl");
    }

    #[test]
    fn test_update_media_is_tri_state() {
        let mut fields = Vec::new();

        assert_eq!(media_for_update(MediaField::Image, None, None, &mut fields), None);
        assert_eq!(
            media_for_update(MediaField::Image, Some(None), None, &mut fields),
            Some(MediaUpdate::clear())
        );
        assert_eq!(
            media_for_update(MediaField::Image, Some(Some(String::new())), None, &mut fields),
            Some(MediaUpdate::clear())
        );
        assert_eq!(
            media_for_update(
                MediaField::Image,
                Some(Some("https://media.example.com/team/1-jo.png".to_string())),
                None,
                &mut fields
            ),
            Some(MediaUpdate::set("https://media.example.com/team/1-jo.png", None))
        );
        assert!(fields.is_empty());

        assert_eq!(
            media_for_update(MediaField::Image, None, Some("team/1-jo.png".to_string()), &mut fields),
            None
        );
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_ensure_valid() {
        assert!(ensure_valid(Vec::new()).is_ok());
        let err = ensure_valid(vec![FieldError::new("videoUrl", "bad")]).unwrap_err();
        assert!(matches!(err, Error::Validation { ref fields } if fields.len() == 1));
    }
}
