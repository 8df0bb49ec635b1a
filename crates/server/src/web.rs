//! Server-rendered upload page.
//!
//! The template is embedded with `include_str!` and registered on a bare
//! `Tera`, so the binary needs no template directory at runtime.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use catalog::ProductDocument;
use recommend::{CategoryFailure, Gender, Recommendations, CATEGORY_MAPPING};
use serde::Serialize;
use tera::{Context, Tera};

use crate::error::ServerResult;
use crate::upload::SavedUpload;

const TPL_INDEX: &str = include_str!("../templates/index.html");

pub const PAGE_TITLE: &str = "Fashion Buddy 🛍️";
pub const PAGE_TAGLINE: &str = "Fashion Buddy is where Vector Search 🤝 Fashion.";
pub const PAGE_DESCRIPTION: &str = "Say goodbye to wardrobe dilemmas and hello to effortless style. It's designed to help YOU find the best outfits and clothing items! All you need to do is upload any outfit or piece of clothing, and we'll find outfits that are similar. Give it a try!";

/// Web interface manager
pub struct WebInterface {
    templates: Tera,
}

impl WebInterface {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template("index.html", TPL_INDEX)?;
        Ok(Self { templates: tera })
    }

    pub fn render_page(&self, view: &PageView) -> ServerResult<String> {
        let mut context = Context::new();
        context.insert("vm", view);
        Ok(self.templates.render("index.html", &context)?)
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryOption {
    pub label: &'static str,
    pub code: &'static str,
    pub checked: bool,
}

#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub product_name: String,
    pub price: String,
    pub gender: String,
    pub details: String,
    pub link: String,
    pub images: Vec<String>,
    pub similarity: Option<String>,
}

impl From<&ProductDocument> for DocumentView {
    fn from(doc: &ProductDocument) -> Self {
        Self {
            product_name: doc.product_name.clone(),
            price: doc.price.to_string(),
            gender: doc.gender.clone(),
            details: doc.details.clone(),
            link: doc.link.clone(),
            images: doc.product_images.clone(),
            similarity: doc.similarity.map(|s| format!("{s:.4}")),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupView {
    pub category: Option<String>,
    pub documents: Vec<DocumentView>,
}

/// Everything the page template reads.
#[derive(Debug, Serialize)]
pub struct PageView {
    pub title: &'static str,
    pub tagline: &'static str,
    pub description: &'static str,
    pub genders: Vec<&'static str>,
    pub selected_gender: &'static str,
    pub categories: Vec<CategoryOption>,
    pub uploaded_name: Option<String>,
    pub preview: Option<String>,
    pub groups: Vec<GroupView>,
    pub failures: Vec<CategoryFailure>,
    pub error: Option<String>,
}

impl PageView {
    /// Empty form with the given filters pre-selected.
    pub fn new<S: AsRef<str>>(gender: Gender, selected: &[S]) -> Self {
        Self {
            title: PAGE_TITLE,
            tagline: PAGE_TAGLINE,
            description: PAGE_DESCRIPTION,
            genders: Gender::ALL.iter().map(Gender::label).collect(),
            selected_gender: gender.label(),
            categories: CATEGORY_MAPPING
                .iter()
                .map(|&(label, code)| CategoryOption {
                    label,
                    code,
                    checked: selected
                        .iter()
                        .any(|s| s.as_ref() == label || s.as_ref() == code),
                })
                .collect(),
            uploaded_name: None,
            preview: None,
            groups: Vec::new(),
            failures: Vec::new(),
            error: None,
        }
    }

    pub fn with_upload(mut self, upload: &SavedUpload) -> Self {
        self.uploaded_name = Some(upload.file_name.clone());
        self.preview = Some(format!(
            "data:image/jpeg;base64,{}",
            BASE64.encode(&upload.jpeg)
        ));
        self
    }

    pub fn with_results(mut self, recs: &Recommendations) -> Self {
        self.groups = recs
            .groups
            .iter()
            .map(|g| GroupView {
                category: g.category.clone(),
                documents: g.documents.iter().map(DocumentView::from).collect(),
            })
            .collect();
        self.failures = recs.failures.clone();
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

impl Default for PageView {
    fn default() -> Self {
        Self::new::<&str>(Gender::Men, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::Price;
    use recommend::RecommendationGroup;

    fn doc(name: &str, similarity: Option<f32>) -> ProductDocument {
        ProductDocument {
            product_name: name.into(),
            price: Price::Amount(49.5),
            gender: "women".into(),
            details: "Soft knit".into(),
            link: "https://shop.example/item".into(),
            product_images: vec!["https://img.example/item.jpg".into()],
            similarity,
            ..Default::default()
        }
    }

    #[test]
    fn empty_page_lists_filters() {
        let web = WebInterface::new().unwrap();
        let html = web.render_page(&PageView::default()).unwrap();
        assert!(html.contains("Fashion Buddy"));
        assert!(html.contains("Recommend Products"));
        for label in ["Tops", "Outerwear", "Bottoms", "Accessories", "Activewear", "Shoes"] {
            assert!(html.contains(&format!("value=\"{label}\"")));
        }
        assert!(html.contains("value=\"Men\" checked"));
        assert!(!html.contains("Category:"));
    }

    #[test]
    fn selected_filters_are_checked() {
        let view = PageView::new(Gender::Women, &["Shoes", "TOPS"]);
        let checked: Vec<_> = view
            .categories
            .iter()
            .filter(|c| c.checked)
            .map(|c| c.code)
            .collect();
        assert_eq!(checked, vec!["TOPS", "SHOES"]);
        assert_eq!(view.selected_gender, "Women");
    }

    #[test]
    fn results_render_scores_only_when_present() {
        let recs = Recommendations {
            groups: vec![
                RecommendationGroup {
                    category: Some("TOPS".into()),
                    documents: vec![doc("Cardigan", Some(0.8123))],
                },
                RecommendationGroup {
                    category: None,
                    documents: vec![doc("Sweater", None)],
                },
            ],
            failures: vec![CategoryFailure {
                category: "SHOES".into(),
                error: "timed out".into(),
            }],
        };
        let web = WebInterface::new().unwrap();
        let html = web
            .render_page(&PageView::new(Gender::Women, &["Tops"]).with_results(&recs))
            .unwrap();

        assert!(html.contains("Category: TOPS"));
        assert_eq!(html.matches("Category:").count(), 1);
        assert!(!html.contains("Category: None"));
        assert!(html.contains("Cardigan"));
        assert!(html.contains("Sweater"));
        assert!(html.contains("$49.50"));
        assert_eq!(html.matches("Similarity score:").count(), 1);
        assert!(html.contains("0.8123"));
        assert!(html.contains("SHOES could not be searched"));
    }

    #[test]
    fn error_banner_is_escaped() {
        let web = WebInterface::new().unwrap();
        let html = web
            .render_page(&PageView::default().with_error("<script>bad</script>"))
            .unwrap();
        assert!(html.contains("&lt;script&gt;"));
    }
}
