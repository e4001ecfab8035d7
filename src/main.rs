mod api;
mod config;
mod form;
mod models;
mod normalize;
mod notify;
mod session;

use anyhow::{Context, Result};
use api::{
    AdminApi, ApiError, AuthApi, CategoryApi, Credentials, FeedOutcome, HttpDirectoryClient, ListingApi,
    ListingFeed, ListingFilters, NewCategory,
};
use clap::{Parser, Subcommand};
use config::Config;
use form::ListingDraft;
use normalize::attributes::{self, RawAttributes};
use notify::Notice;
use session::{SessionContext, SessionStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "directory-desk", version, about = "Manage categories and listings of the directory backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Show the saved session
    Whoami,
    /// List categories
    Categories,
    /// Create a category
    CategoryCreate {
        name: String,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        icon: String,
    },
    /// Rename or edit a category
    CategoryUpdate {
        id: String,
        name: String,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        icon: String,
        #[arg(long)]
        inactive: bool,
    },
    /// Delete a category (fails while listings still use it)
    CategoryDelete { id: String },
    /// Browse listings page by page
    Listings {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        featured: bool,
        #[arg(long)]
        min_price: Option<f64>,
        #[arg(long)]
        max_price: Option<f64>,
        /// How many pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Show one listing as JSON
    Listing { id: String },
    /// Show a listing's opening hours
    Hours { id: String },
    /// Create a listing from a JSON draft, or update one with --id
    Submit {
        draft: PathBuf,
        #[arg(long)]
        id: Option<String>,
    },
    /// Delete a listing
    Delete { id: String },
    /// Admin dashboard counters
    Stats,
    /// Show how a stored attributes value decodes
    DecodeAttributes { value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    if let Err(e) = run(cli.command, &config).await {
        match e.downcast_ref::<ApiError>() {
            Some(api_error) => {
                error!("{}", api_error);
                println!("{}", Notice::from_error(api_error));
            }
            None => error!("{:#}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<()> {
    let store = SessionStore::new(&config.session_file);
    let session = Arc::new(SessionContext::new(store.load()?));
    let client = HttpDirectoryClient::new(config, Arc::clone(&session))?;

    match command {
        Command::Login { email, password } => {
            let credentials = Credentials { email, password };
            let user = client.login(&credentials).await?;
            store.save(&user)?;
            session.begin(user.clone());
            println!("{}", Notice::success(format!("Logged in as {} ({})", user.display_name, user.role)));
        }
        Command::Logout => {
            match session.end() {
                Some(user) => info!("Logging out {}", user.display_name),
                None => info!("No active session"),
            }
            store.clear()?;
            println!("{}", Notice::success("Logged out"));
        }
        Command::Whoami => match session.current() {
            Some(user) => println!("{} ({}), session file {}", user.display_name, user.role, store.path().display()),
            None => println!("Not logged in"),
        },
        Command::Categories => {
            let categories = client.list_categories().await?;
            info!("Loaded {} categories", categories.len());
            for category in &categories {
                let state = if category.active { "" } else { " [inactive]" };
                println!("{}  {} ({}){}", category.id, category.name, category.slug, state);
            }
        }
        Command::CategoryCreate {
            name,
            slug,
            description,
            icon,
        } => {
            if !session.current().map_or(false, |s| s.can_manage_categories()) {
                warn!("Creating categories usually requires an admin session");
            }
            let mut new_category = NewCategory::named(&name);
            if let Some(slug) = slug {
                new_category.slug = slug;
            }
            new_category.description = description;
            new_category.icon = icon;

            let category = client.create_category(&new_category).await?;
            println!("{}", Notice::success(format!("Created category {} ({})", category.name, category.id)));
        }
        Command::CategoryUpdate {
            id,
            name,
            slug,
            description,
            icon,
            inactive,
        } => {
            let mut changes = NewCategory::named(&name);
            if let Some(slug) = slug {
                changes.slug = slug;
            }
            changes.description = description;
            changes.icon = icon;
            changes.active = !inactive;

            let category = client.update_category(&id, &changes).await?;
            println!("{}", Notice::success(format!("Updated category {} ({})", category.name, category.id)));
        }
        Command::CategoryDelete { id } => {
            client.delete_category(&id).await?;
            println!("{}", Notice::success(format!("Deleted category {}", id)));
        }
        Command::Listings {
            category,
            search,
            city,
            featured,
            min_price,
            max_price,
            pages,
        } => {
            let filters = ListingFilters {
                category,
                search,
                city,
                featured,
                min_price,
                max_price,
                limit: config.page_size,
            };
            let feed = ListingFeed::new(ListingFilters::default());
            feed.reset(filters);
            for _ in 0..pages {
                match feed.load_more(&client).await? {
                    FeedOutcome::Appended(count) => info!("Loaded {} listings", count),
                    FeedOutcome::Exhausted | FeedOutcome::Discarded => break,
                }
                if feed.is_exhausted() {
                    break;
                }
            }

            info!("{} listings loaded", feed.len());
            for (i, listing) in feed.listings().iter().enumerate() {
                let featured = if listing.is_featured { " ★" } else { "" };
                println!("{}. {}{} ({})", i + 1, listing.name, featured, listing.price);
                if let Some(category) = &listing.category {
                    println!("   Category: {}", category.name().unwrap_or(category.id()));
                }
                if !listing.location.is_empty() {
                    println!("   {}", listing.location);
                }
                if !listing.amenities.is_empty() {
                    println!("   Amenities: {}", listing.amenities.join(", "));
                }
                if !listing.attributes.is_empty() {
                    println!("   Attributes: {}", listing.attributes.as_str());
                }
                println!("   ID: {}", listing.id);
            }
        }
        Command::Listing { id } => {
            let listing = client.get_listing(&id).await?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Command::Hours { id } => {
            let hours = client.listing_hours(&id).await?;
            if hours.is_empty() {
                println!("No opening hours set");
            }
            for (day, slot) in &hours {
                println!("{:<10} {} - {}", day, slot.open, slot.close);
            }
        }
        Command::Submit { draft: path, id } => {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read draft {}", path.display()))?;
            let draft: ListingDraft =
                serde_json::from_str(&raw).with_context(|| format!("Draft {} is not valid JSON", path.display()))?;
            if let Some(tab) = draft.first_invalid_tab() {
                warn!("Draft {} needs fixes, starting on the {:?} tab", path.display(), tab);
                for problem in draft.validate() {
                    warn!("  {:?}: {}", problem.tab, problem);
                }
            }

            let listing = form::submit_draft(&client, &draft, id.as_deref()).await?;
            println!("{}", Notice::success(format!("Saved {} ({})", listing.name, listing.id)));
        }
        Command::Delete { id } => {
            client.delete_listing(&id).await?;
            println!("{}", Notice::success(format!("Deleted listing {}", id)));
        }
        Command::Stats => {
            let stats = client.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::DecodeAttributes { value } => {
            let raw = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
            println!("{:?}", RawAttributes::classify(&raw));
            println!("{}", attributes::decode(&raw));
        }
    }

    Ok(())
}
