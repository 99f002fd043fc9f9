//! Demo catalog seed.
//!
//! Entries are keyed by slug; existing slugs are left untouched so the
//! command can be re-run safely.

use atelier_core::Cents;
use atelier_server::db::catalog::{self, NewProduct, NewService};
use tracing::info;

use super::{CliError, connect};

struct DemoService {
    slug: &'static str,
    title: &'static str,
    description: &'static str,
    base_price: i64,
    tags: &'static [&'static str],
}

struct DemoProduct {
    slug: &'static str,
    title: &'static str,
    description: &'static str,
    price: i64,
    sku: &'static str,
    tags: &'static [&'static str],
}

const SERVICES: &[DemoService] = &[
    DemoService {
        slug: "brand-identity",
        title: "Brand Identity",
        description: "Logo, palette and typography delivered as a compact brand guide.",
        base_price: 120_000,
        tags: &["design", "branding"],
    },
    DemoService {
        slug: "landing-page",
        title: "Landing Page",
        description: "A single responsive page designed and built around your launch.",
        base_price: 90_000,
        tags: &["web", "design"],
    },
    DemoService {
        slug: "portfolio-review",
        title: "Portfolio Review Session",
        description: "One hour of live feedback on your portfolio with written notes.",
        base_price: 15_000,
        tags: &["coaching"],
    },
];

const PRODUCTS: &[DemoProduct] = &[
    DemoProduct {
        slug: "icon-pack",
        title: "Line Icon Pack",
        description: "240 hand-drawn line icons in SVG and PNG.",
        price: 2_900,
        sku: "DIG-ICONS-01",
        tags: &["icons", "digital"],
    },
    DemoProduct {
        slug: "pitch-deck-template",
        title: "Pitch Deck Template",
        description: "A 30-slide deck template for Keynote and Google Slides.",
        price: 4_900,
        sku: "DIG-DECK-01",
        tags: &["template", "digital"],
    },
];

fn owned_tags(tags: &[&str]) -> Option<Vec<String>> {
    Some(tags.iter().map(|t| (*t).to_owned()).collect())
}

/// Insert any demo entries that are missing.
///
/// # Errors
///
/// Returns `CliError` if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;
    let mut created = 0_usize;

    for demo in SERVICES {
        if catalog::service_slug_taken(&pool, demo.slug, None).await? {
            info!(slug = demo.slug, "Service exists, skipping");
            continue;
        }
        catalog::create_service(
            &pool,
            NewService {
                slug: demo.slug.to_owned(),
                title: demo.title.to_owned(),
                description: demo.description.to_owned(),
                base_price_cents: Cents::new(demo.base_price),
                is_active: Some(true),
                tags: owned_tags(demo.tags),
            },
        )
        .await?;
        created += 1;
    }

    for demo in PRODUCTS {
        if catalog::product_slug_taken(&pool, demo.slug, None).await? {
            info!(slug = demo.slug, "Product exists, skipping");
            continue;
        }
        catalog::create_product(
            &pool,
            NewProduct {
                slug: demo.slug.to_owned(),
                title: demo.title.to_owned(),
                description: demo.description.to_owned(),
                price_cents: Cents::new(demo.price),
                is_active: Some(true),
                sku: Some(demo.sku.to_owned()),
                tags: owned_tags(demo.tags),
                cover_image_url: None,
                digital_file_url: Some(format!("https://files.example.com/{}.zip", demo.slug)),
            },
        )
        .await?;
        created += 1;
    }

    info!(created, "Seed complete");
    Ok(())
}
