use anyhow::Result;
use clap::{Parser, Subcommand};
use mealsmith::clients::{
    CheckoutClient, GenerateMealPlanRequest, GenerationMode, HttpSessionStore,
    MealGenerationClient,
};
use mealsmith::config::Config;
use mealsmith::error::AppError;
use mealsmith::pipeline::MealPlanPipeline;
use mealsmith_mealplan::MealPlan;
use mealsmith_shopping::{format_item, ShoppingList};
use mealsmith_storage::{CheckoutLinkStore, LocalCache};

/// mealsmith - meal plans, shopping lists, and checkout links
#[derive(Parser)]
#[command(name = "mealsmith")]
#[command(about = "Generate meal plans and turn them into shopping lists", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    /// User id for the remote session tier
    #[arg(long, global = true, default_value = "local")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a meal plan, accept it, and create a checkout link
    Generate {
        /// Natural-language description, e.g. "easy family dinners for 4"
        description: String,

        /// Generation mode: quick, plan, diet, or saved
        #[arg(long, default_value = "plan")]
        mode: String,

        /// Plan duration in days
        #[arg(long, default_value_t = 7)]
        duration: u32,

        #[arg(long)]
        servings: Option<u32>,

        /// Dietary restriction tag (repeatable)
        #[arg(long = "restrict")]
        dietary_restrictions: Vec<String>,

        /// Preferred store (repeatable)
        #[arg(long = "store")]
        preferred_stores: Vec<String>,

        #[arg(long)]
        calorie_target: Option<u32>,

        /// Skip checkout link creation
        #[arg(long)]
        no_link: bool,
    },
    /// Print the cached shopping list of the last accepted plan
    ShoppingList,
    /// Print the saved checkout URL for a plan
    Link {
        #[arg(long)]
        plan_id: Option<String>,
    },
    /// List locally saved plans, newest first
    SavedPlans,
}

type Pipeline = MealPlanPipeline<MealGenerationClient, CheckoutClient, HttpSessionStore>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.clone())?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    mealsmith::observability::init_observability(
        "mealsmith",
        env!("CARGO_PKG_VERSION"),
        &config.observability.log_level,
    )?;

    let pipeline = build_pipeline(&config, &cli.user).await?;

    match cli.command {
        Commands::Generate {
            description,
            mode,
            duration,
            servings,
            dietary_restrictions,
            preferred_stores,
            calorie_target,
            no_link,
        } => {
            let mode = mode.parse::<GenerationMode>().map_err(|_| {
                anyhow::anyhow!("unknown mode '{mode}' (expected quick, plan, diet, or saved)")
            })?;
            let mut request = GenerateMealPlanRequest::new(mode, description, duration);
            request.servings = servings;
            request.dietary_restrictions = dietary_restrictions;
            request.preferred_stores = preferred_stores;
            request.daily_calorie_target = calorie_target;

            generate_command(&pipeline, &request, no_link).await
        }
        Commands::ShoppingList => shopping_list_command(&pipeline).await,
        Commands::Link { plan_id } => link_command(&pipeline, plan_id.as_deref()).await,
        Commands::SavedPlans => saved_plans_command(&pipeline).await,
    }
}

async fn build_pipeline(config: &Config, user_id: &str) -> Result<Pipeline> {
    let cache = LocalCache::open(&config.cache.database_url, config.cache.max_connections).await?;
    let http = reqwest::Client::new();

    let generator = MealGenerationClient::new(
        http.clone(),
        config.api.base_url.clone(),
        config.api.auth_token.clone(),
    );
    let checkout = CheckoutClient::new(
        http.clone(),
        config.api.services_url.clone(),
        config.api.auth_token.clone(),
    );
    let session = HttpSessionStore::new(
        http,
        config.api.base_url.clone(),
        config.api.auth_token.clone(),
    );

    let links = CheckoutLinkStore::new(session, cache, user_id);
    Ok(MealPlanPipeline::new(generator, checkout, links))
}

#[tracing::instrument(skip(pipeline, request), fields(duration = request.duration))]
async fn generate_command(
    pipeline: &Pipeline,
    request: &GenerateMealPlanRequest,
    no_link: bool,
) -> Result<()> {
    let plan = pipeline.generate(request).await?;
    print_plan(&plan);

    let list = pipeline.accept(&plan).await?;
    print_shopping_list(&list);

    if no_link {
        return Ok(());
    }

    match pipeline.create_checkout_link(&plan).await {
        Ok(link) => {
            println!("\nCheckout link ({} items): {}", link.item_count, link.url);
            pipeline.save_plan_locally(&plan, Some(&link.url)).await?;
        }
        Err(err @ (AppError::Http(_) | AppError::MissingLink | AppError::EmptyShoppingList)) => {
            // The shopping list is already cached; the user can retry the
            // link later with the `link` command.
            tracing::warn!(error = %err, "checkout link creation failed");
            println!("\nCheckout link unavailable: {err}");
            pipeline.save_plan_locally(&plan, None).await?;
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

#[tracing::instrument(skip(pipeline))]
async fn shopping_list_command(pipeline: &Pipeline) -> Result<()> {
    match pipeline.cached_shopping_list().await? {
        Some(list) => print_shopping_list(&list),
        None => println!("No shopping list cached yet. Run `mealsmith generate` first."),
    }
    Ok(())
}

#[tracing::instrument(skip(pipeline))]
async fn link_command(pipeline: &Pipeline, plan_id: Option<&str>) -> Result<()> {
    match pipeline.saved_link(plan_id).await? {
        Some(url) => println!("{url}"),
        None => println!("No saved checkout link found."),
    }
    Ok(())
}

#[tracing::instrument(skip(pipeline))]
async fn saved_plans_command(pipeline: &Pipeline) -> Result<()> {
    let plans = pipeline.saved_plans().await?;
    if plans.is_empty() {
        println!("No plans saved on this device.");
        return Ok(());
    }
    for saved in plans {
        println!(
            "{}  {} ({} days, {} meals){}",
            saved.saved_at.format("%Y-%m-%d"),
            saved.plan.name,
            saved.plan.duration_days,
            saved.plan.total_meals(),
            saved
                .checkout_url
                .as_deref()
                .map(|url| format!("  {url}"))
                .unwrap_or_default(),
        );
    }
    Ok(())
}

fn print_plan(plan: &MealPlan) {
    println!("{} — {}", plan.name, plan.description);
    println!(
        "{} days, {} meals, avg {:.0} kcal/day",
        plan.days.len(),
        plan.summary.total_meals,
        plan.summary.avg_calories_per_day
    );
    for day in &plan.days {
        println!("\n  Day {} ({} {})", day.day_number, day.day_name, day.date);
        for meal in &day.meals {
            println!(
                "    {:<9} {} ({:.0} kcal)",
                meal.meal_type.to_string(),
                meal.meal_name,
                meal.calories
            );
        }
    }
}

fn print_shopping_list(list: &ShoppingList) {
    if list.is_empty() {
        println!("\nShopping list is empty.");
        return;
    }
    println!("\nShopping list ({} items):", list.total_items());
    for (category, items) in list.categories() {
        if items.is_empty() {
            continue;
        }
        println!("  {}:", category.as_str());
        for item in items {
            println!("    - {}", format_item(item));
        }
    }
}
