//! Server-rendered pages: summary, gallery, upload form and the form-driven
//! delete. Markup is assembled inline; flash messages travel as a `notice`
//! query parameter on redirects.

use crate::{
    handlers::photo_handlers::upload_from_request,
    models::{presentable::PresentablePhoto, upload::UploadResult},
    services::photo_service::PhotoService,
};
use axum::{
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

/// One-shot status shown at the top of the gallery after a redirect.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    Uploaded,
    Deleted,
    DeleteFailed,
}

impl Notice {
    fn message(self) -> (&'static str, &'static str) {
        match self {
            Notice::Uploaded => ("success", "Photo uploaded successfully"),
            Notice::Deleted => ("success", "Photo deleted successfully"),
            Notice::DeleteFailed => ("error", "Failed to delete photo"),
        }
    }

    fn query(self) -> &'static str {
        match self {
            Notice::Uploaded => "uploaded",
            Notice::Deleted => "deleted",
            Notice::DeleteFailed => "delete_failed",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<Notice>,
}

/// GET `/` — landing page with the photo count.
pub async fn index(State(service): State<PhotoService>) -> Html<String> {
    let photo_count = service.count().await.unwrap_or_else(|err| {
        error!("failed to count photos: {}", err);
        0
    });

    let body = format!(
        concat!(
            "<h1>Photo Gallery</h1>",
            "<p>{count} photo{plural} stored.</p>",
            r#"<p><a href="/gallery">View gallery</a> | <a href="/upload">Upload a photo</a></p>"#
        ),
        count = photo_count,
        plural = if photo_count == 1 { "" } else { "s" },
    );
    Html(layout("Photo Gallery", &body))
}

/// GET `/gallery`
pub async fn gallery(
    State(service): State<PhotoService>,
    Query(q): Query<NoticeQuery>,
) -> Html<String> {
    let mut body = String::from("<h1>Photo Gallery</h1>");
    if let Some(notice) = q.notice {
        let (class, message) = notice.message();
        body.push_str(&flash(class, message));
    }

    let loaded = match service.list_all().await {
        Ok(photos) => service.count().await.map(|count| (photos, count)),
        Err(err) => Err(err),
    };

    match loaded {
        Ok((photos, count)) => {
            debug!("Displaying gallery with {} photos", photos.len());
            body.push_str(&format!("<p>{} photos in total.</p>", count));
            body.push_str(&gallery_grid(&photos));
        }
        Err(err) => {
            error!("Error loading gallery: {}", err);
            body.push_str(&flash(
                "error",
                "Failed to load photos. Please try again later.",
            ));
        }
    }

    Html(layout("Photo Gallery", &body))
}

/// GET `/upload`
pub async fn upload_form() -> Html<String> {
    Html(layout("Upload Photo", &upload_form_body(None)))
}

/// POST `/upload` — redirect to the gallery on success, re-render the form otherwise.
pub async fn upload_submit(
    State(service): State<PhotoService>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    match upload_from_request(&service, multipart).await {
        UploadResult::Success { photo_id, .. } => {
            info!("Photo uploaded successfully with ID: {}", photo_id);
            Redirect::to(&gallery_url(Notice::Uploaded)).into_response()
        }
        UploadResult::Failure { message } => (
            StatusCode::BAD_REQUEST,
            Html(layout("Upload Photo", &upload_form_body(Some(&message)))),
        )
            .into_response(),
    }
}

/// POST `/photos/{id}/delete`
pub async fn delete_photo(
    State(service): State<PhotoService>,
    Path(id): Path<i64>,
) -> Redirect {
    let notice = if service.delete_photo(id).await {
        info!("Photo with ID {} deleted successfully", id);
        Notice::Deleted
    } else {
        warn!("Failed to delete photo with ID {}", id);
        Notice::DeleteFailed
    };
    Redirect::to(&gallery_url(notice))
}

fn gallery_url(notice: Notice) -> String {
    format!("/gallery?notice={}", notice.query())
}

fn gallery_grid(photos: &[PresentablePhoto]) -> String {
    if photos.is_empty() {
        return r#"<p>No photos yet. <a href="/upload">Upload the first one.</a></p>"#.to_string();
    }

    let mut html = String::from(r#"<div class="gallery">"#);
    for photo in photos {
        let url = photo.presigned_url.as_deref().unwrap_or("");
        html.push_str("<figure>");
        html.push_str(&format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            html_escape(url),
            html_escape(&photo.filename)
        ));
        html.push_str(&format!(
            "<figcaption><strong>{}</strong> ({}, {})",
            html_escape(&photo.filename),
            html_escape(&photo.content_type),
            html_escape(&photo.formatted_file_size)
        ));
        if let Some(description) = photo.description.as_deref() {
            html.push_str(&format!("<br>{}", html_escape(description)));
        }
        html.push_str(&format!(
            "<br><small>{}</small></figcaption>",
            photo.uploaded_at.format("%Y-%m-%d %H:%M UTC")
        ));
        html.push_str(&format!(
            r#"<form method="post" action="/photos/{}/delete"><button type="submit">Delete</button></form>"#,
            photo.id
        ));
        html.push_str("</figure>");
    }
    html.push_str("</div>");
    html
}

fn upload_form_body(error: Option<&str>) -> String {
    let mut body = String::from("<h1>Upload Photo</h1>");
    if let Some(message) = error {
        body.push_str(&flash("error", message));
    }
    body.push_str(concat!(
        r#"<form method="post" action="/upload" enctype="multipart/form-data">"#,
        r#"<p><input type="file" name="file" accept="image/jpeg,image/png,image/gif,image/webp" required></p>"#,
        r#"<p><textarea name="description" placeholder="Description (optional)"></textarea></p>"#,
        r#"<p><button type="submit">Upload</button></p>"#,
        "</form>",
        "<p>JPEG, PNG, GIF or WebP, up to 10MB.</p>"
    ));
    body
}

fn flash(class: &str, message: &str) -> String {
    format!(
        r#"<div class="flash {}">{}</div>"#,
        class,
        html_escape(message)
    )
}

fn layout(title: &str, body: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>",
            r#"<html lang="en"><head><meta charset="utf-8">"#,
            "<title>{title}</title></head>",
            r#"<body><nav><a href="/">Home</a> | <a href="/gallery">Gallery</a> | <a href="/upload">Upload</a></nav>"#,
            "<main>{body}</main></body></html>"
        ),
        title = html_escape(title),
        body = body
    )
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape(r#"<img src="x" onerror='a&b'>"#),
            "&lt;img src=&quot;x&quot; onerror=&#39;a&amp;b&#39;&gt;"
        );
    }

    #[test]
    fn notice_round_trips_through_query() {
        for notice in [Notice::Uploaded, Notice::Deleted, Notice::DeleteFailed] {
            let url = gallery_url(notice);
            let query = url.split_once('?').unwrap().1;
            let parsed: NoticeQuery =
                serde_json::from_value(serde_json::json!({ "notice": query.trim_start_matches("notice=") }))
                    .unwrap();
            assert_eq!(parsed.notice, Some(notice));
        }
    }

    #[test]
    fn upload_form_shows_escaped_error() {
        let body = upload_form_body(Some("<bad>"));
        assert!(body.contains("&lt;bad&gt;"));
        assert!(body.contains(r#"name="file""#));
    }
}
