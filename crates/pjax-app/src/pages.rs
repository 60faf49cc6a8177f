//! Page hooks for the site's pages.

use pjax_html::Selector;
use pjax_nav::{NavigationContext, PageDescriptor, PageRegistry};

const BLOG_POSTS: &str = "<article><h2>First Blog Post</h2>\
    <p>This would be loaded dynamically when the page loads via PJAX</p></article>\
    <article><h2>Second Blog Post</h2>\
    <p>Another example of dynamic content that's only loaded when needed</p></article>";

/// Register the home, code-of-conduct, about, blog and contact pages.
pub fn register_site_pages(registry: &mut PageRegistry) {
    registry.register_page(
        "/",
        PageDescriptor::new().on_load(|_| log::info!("Home page loaded")),
    );
    registry.register_page(
        "/coc.html",
        PageDescriptor::new().on_load(|_| log::info!("Code of Conduct page loaded")),
    );
    registry.register_page(
        "/about.html",
        PageDescriptor::new()
            .with_title("About Us")
            .on_load(about_loaded)
            .on_unload(|_| log::info!("Leaving about page")),
    );
    registry.register_page(
        "/blog.html",
        PageDescriptor::new().with_title("Blog").on_load(blog_loaded),
    );
    registry.register_page(
        "/contact.html",
        PageDescriptor::new()
            .with_title("Contact Us")
            .on_load(contact_loaded),
    );
}

fn count_matches(ctx: &NavigationContext<'_>, selector: &str) -> usize {
    Selector::parse(selector)
        .map(|s| ctx.document.query_selector_all(ctx.container, &s).len())
        .unwrap_or(0)
}

fn about_loaded(ctx: &mut NavigationContext<'_>) {
    log::info!("About page loaded");
    let maps = count_matches(ctx, ".interactive-map");
    if maps > 0 {
        log::info!("{maps} map element(s) found");
    }
}

fn blog_loaded(ctx: &mut NavigationContext<'_>) {
    log::info!("Blog page loaded");
    let Some(selector) = Selector::parse(".blog-posts") else {
        return;
    };
    if let Some(posts) = ctx.document.query_selector(ctx.container, &selector) {
        ctx.document.set_inner_html(posts, BLOG_POSTS);
    }
}

fn contact_loaded(ctx: &mut NavigationContext<'_>) {
    log::info!("Contact page loaded");
    if count_matches(ctx, "#contact-form") == 0 {
        log::warn!("No contact form on {}", ctx.path);
    }
}
