use crate::application::auth::Session;
use crate::config::SiteSettings;
use crate::presentation::views::{
    BrandView, FooterView, LayoutChrome, NavigationLinkView, NavigationView, ViewerView,
};

/// Builds the page chrome shared by every rendered view.
#[derive(Clone)]
pub struct ChromeService {
    site: SiteSettings,
}

impl ChromeService {
    pub fn new(site: SiteSettings) -> Self {
        Self { site }
    }

    pub fn load(&self, session: Option<&Session>) -> LayoutChrome {
        let entries = self
            .site
            .nav_categories
            .iter()
            .map(|category| NavigationLinkView {
                label: category.clone(),
                href: category_href(category),
                is_active: false,
            })
            .collect();

        let viewer = match session {
            Some(session) => ViewerView {
                signed_in: true,
                is_admin: session.user.is_admin,
                email: session.user.email.clone(),
            },
            None => ViewerView::default(),
        };

        LayoutChrome {
            brand: BrandView {
                title: self.site.brand_title.clone(),
                href: "/".to_string(),
            },
            navigation: NavigationView { entries },
            footer: FooterView {
                copy: self.site.footer_copy.clone(),
            },
            viewer,
            page_title: self.site.brand_title.clone(),
            search: String::new(),
        }
    }
}

pub fn category_href(category: &str) -> String {
    let mut url = String::from("/?");
    url.push_str(
        &url::form_urlencoded::Serializer::new(String::new())
            .append_pair("category", category)
            .finish(),
    );
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::auth::AuthUser;
    use uuid::Uuid;

    fn site() -> SiteSettings {
        SiteSettings {
            brand_title: "BlogHub".into(),
            nav_categories: vec!["Development".into(), "Design & UX".into()],
            footer_copy: "footer".into(),
            secure_cookies: false,
        }
    }

    #[test]
    fn category_links_are_query_encoded() {
        assert_eq!(category_href("Design & UX"), "/?category=Design+%26+UX");
    }

    #[test]
    fn chrome_reflects_the_viewer() {
        let chrome = ChromeService::new(site());
        assert!(!chrome.load(None).viewer.signed_in);

        let session = Session {
            access_token: "t".into(),
            user: AuthUser {
                id: Uuid::nil(),
                email: Some("admin@bloghub.dev".into()),
                is_admin: true,
            },
        };
        let layout = chrome.load(Some(&session)).with_active_category(Some("Development"));
        assert!(layout.viewer.is_admin);
        assert!(layout.navigation.entries[0].is_active);
        assert!(!layout.navigation.entries[1].is_active);
    }
}
