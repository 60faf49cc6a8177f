//! Headless PJAX session driver.
//!
//! Full-loads the start URL, attaches the navigator, then replays each
//! step: a URL or path to navigate to, `click:<href>` to click a link,
//! or `back` / `forward`. Navigations that fall back to a full load are
//! carried out and the navigator is rebuilt on the new page. The final
//! location, title and content are printed.
//!
//! Set `PJAX_CONFIG` to a TOML file to override the defaults.

mod pages;
mod session;

use std::path::Path;

use anyhow::{Result, bail};
use pjax_nav::{History, NavigationOutcome, PageRegistry};
use pjax_types::config::PjaxConfig;

use session::Step;

const USAGE: &str = "usage: pjax-app <start-url> [<url>|click:<href>|back|forward ...]";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::var("PJAX_CONFIG") {
        Ok(path) => PjaxConfig::load(Path::new(&path))?,
        Err(_) => PjaxConfig::default(),
    };

    let mut args = std::env::args().skip(1);
    let Some(start) = args.next() else {
        bail!(USAGE);
    };
    let steps: Vec<Step> = args.map(|arg| Step::parse(&arg)).collect();

    let mut registry = PageRegistry::new();
    pages::register_site_pages(&mut registry);

    let page = session::full_load(&config, &start, History::new())?;
    let mut navigator = session::attach(page, registry, &config);

    for step in &steps {
        match session::run_step(&mut navigator, step) {
            Some(NavigationOutcome::Completed { path, title, .. }) => {
                log::info!("{step:?}: now at {path} \"{title}\"");
            },
            Some(NavigationOutcome::FellBack { url, reason }) => {
                log::warn!("{step:?}: full load of {url} ({reason})");
            },
            Some(NavigationOutcome::Superseded { url, .. }) => {
                log::debug!("{step:?}: superseded navigation to {url}");
            },
            None => log::info!("{step:?}: nothing to navigate"),
        }
        navigator = session::settle(navigator, &config);
    }

    let page = navigator.page();
    println!("location: {}", page.location());
    println!("title: {}", page.title());
    println!("history: {} entries", page.history.len());
    println!("{}", page.document.inner_html(navigator.container()));
    Ok(())
}
