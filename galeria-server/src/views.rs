//! HTML pages, rendered with `maud`. Interpolated values (file names in
//! particular) are escaped by the macro.

use galeria_core::{
    PhotoIndex, PhotoSlot,
    thumbnail::{THUMB_HEIGHT, THUMB_WIDTH, VIEW_WIDTH, view_height_for},
};
use maud::{DOCTYPE, Markup, PreEscaped, html};

const STYLE: &str = "\
body{margin:0;background:#111;color:#ddd;font-family:sans-serif}\
main{display:flex;flex-wrap:wrap;gap:4px;padding:4px;justify-content:center}\
.thumb img{display:block}\
.missing{display:flex;align-items:center;justify-content:center;background:#333;color:#999;font-size:12px;text-align:center;overflow:hidden}\
nav{display:flex;justify-content:space-between;padding:8px}\
nav a{color:#ddd}\
figure{margin:0;text-align:center}\
figure img{max-width:100vw;max-height:calc(100vh - 48px);height:auto}";

/// Widths offered in the view page `srcset`.
const SRCSET_WIDTHS: [u32; 4] = [640, 1280, 1920, 3840];

fn page(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (PreEscaped(STYLE)) }
            }
            body { (body) }
        }
    }
}

/// The thumbnail grid. Each tile links to `/view/{n}`.
pub fn render_index(index: &PhotoIndex) -> Markup {
    let body = html! {
        main {
            @for (number, slot) in index.iter().enumerate() {
                @let name = slot.source_path().file_name();
                @match slot {
                    PhotoSlot::Ready(record) => {
                        a.thumb href={ "/view/" (number) } {
                            img src={ "/thumbs/" (number) }
                                width=(record.width)
                                height=(record.height)
                                alt=(name)
                                loading="lazy";
                        }
                    }
                    PhotoSlot::Tombstone { .. } => {
                        a.thumb.missing
                            href={ "/view/" (number) }
                            style={ "width:" (THUMB_WIDTH) "px;height:" (THUMB_HEIGHT) "px" } {
                            (name)
                        }
                    }
                }
            }
            @if index.is_empty() {
                p { "No photos yet." }
            }
        }
    };

    page(&format!("Galeria ({} photos)", index.len()), body)
}

/// A single photo scaled to the view size, with previous/next navigation.
pub fn render_view(index: &PhotoIndex, number: usize, slot: &PhotoSlot) -> Markup {
    let name = slot.source_path().file_name();
    let srcset = SRCSET_WIDTHS
        .iter()
        .map(|w| format!("/photos/{number}?width={w} {w}w"))
        .collect::<Vec<_>>()
        .join(", ");

    let body = html! {
        nav {
            @if let Some(prev) = index.previous(number) {
                a href={ "/view/" (prev) } rel="prev" { "← Previous" }
            } @else {
                span {}
            }
            a href="/" { "All photos" }
            @if let Some(next) = index.next(number) {
                a href={ "/view/" (next) } rel="next" { "Next →" }
            } @else {
                span {}
            }
        }
        figure {
            a href={ "/photos/" (number) } {
                img src={ "/photos/" (number) "?width=" (VIEW_WIDTH) }
                    srcset=(srcset)
                    sizes="100vw"
                    width=(VIEW_WIDTH)
                    height=(view_height_for(VIEW_WIDTH))
                    alt=(name);
            }
            figcaption { (name) }
        }
    };

    page(&format!("{name} - Galeria"), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_gallery_renders_a_notice() {
        let html = render_index(&PhotoIndex::default()).into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("No photos yet."));
        assert!(html.contains("<title>Galeria (0 photos)</title>"));
    }

    #[test]
    fn title_text_is_escaped() {
        let html = page("<b>&</b>", html! {}).into_string();
        assert!(html.contains("<title>&lt;b&gt;&amp;&lt;/b&gt;</title>"));
    }
}
