//! Command-line front end.
//!
//! Every screen controller gets a subcommand; list views print a table plus
//! the page-scope caption, mutations print their notification. Destructive
//! commands ask on stdin unless `--yes` is given.
//!
//! ```bash
//! resumeit-admin login -u admin
//! resumeit-admin users list --status active
//! resumeit-admin templates preview 12 --out modern.html --full-out modern-full.html
//! resumeit-admin subscriptions auto-renew 7 false
//! resumeit-admin plans delete 3 --yes
//! ```

mod confirm;
mod output;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{debug, info};

pub use confirm::{AssumeYes, StdinConfirm};

use crate::api::{
    AtsScoreListParams, SubscriptionListParams, TemplateListParams, TransactionListParams,
    UserListParams,
};
use crate::forms::{CategoryForm, PlanForm, TemplateForm};
use crate::models::NewUser;
use crate::preview::{
    build_preview_document, sandboxed_frame_html, FileSurface, Fidelity, MemorySurface,
    PreviewRenderer, PreviewSource, PreviewSurface, RenderStatus,
};
use crate::screens::{
    AnalyticsScreen, Confirm, DashboardScreen, Notification, ScreenContext, SubscriptionsScreen,
    TemplatesScreen, UsersScreen, ViewState,
};
use crate::session::{AuthGate, GateDecision};

/// Access tokens are short-lived; refresh well before they expire.
const TOKEN_REFRESH_INTERVAL: Duration = Duration::from_secs(4 * 60);

/// ResumeIt admin console arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "resumeit-admin", version, about = "ResumeIt admin console")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Answer yes to every confirmation prompt.
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in and store the session tokens.
    Login {
        #[arg(short, long, env = "ADMIN_USERNAME")]
        username: String,

        #[arg(short, long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session.
    Logout,

    /// Show the signed-in account.
    Whoami,

    /// Exchange the refresh token for a new access token. Works after the
    /// access token has expired.
    Refresh,

    /// Overview figures.
    Dashboard {
        /// Reload every N seconds until interrupted.
        #[arg(long, value_name = "SECS")]
        watch: Option<u64>,
    },

    /// User management.
    #[command(subcommand)]
    Users(UsersCommand),

    /// Template management and previews.
    #[command(subcommand)]
    Templates(TemplatesCommand),

    /// Template categories.
    #[command(subcommand)]
    Categories(CategoriesCommand),

    /// Subscription plans.
    #[command(subcommand)]
    Plans(PlansCommand),

    /// Subscriptions.
    #[command(subcommand)]
    Subscriptions(SubscriptionsCommand),

    /// Payment transactions.
    #[command(subcommand)]
    Transactions(TransactionsCommand),

    /// ATS score analytics.
    #[command(subcommand)]
    Analytics(AnalyticsCommand),
}

#[derive(Args, Debug, Clone, Default)]
pub struct PageArgs {
    /// Page number (server default when omitted).
    #[arg(long)]
    pub page: Option<u32>,

    /// Free-text search.
    #[arg(short, long)]
    pub search: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UsersCommand {
    /// List users.
    List {
        #[command(flatten)]
        page: PageArgs,

        /// active, inactive or all.
        #[arg(long)]
        status: Option<String>,

        /// Subscription tier or all.
        #[arg(long)]
        subscription: Option<String>,
    },

    /// One user's account details.
    Show { id: i64 },

    /// Recent activity of one user.
    Activity { id: i64 },

    /// Create a user.
    Create {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long, env = "NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        #[arg(long)]
        staff: bool,

        /// Create the account deactivated.
        #[arg(long)]
        inactive: bool,
    },

    Activate { id: i64 },

    Deactivate { id: i64 },

    /// Delete a user (asks first).
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone, Default)]
pub struct TemplateFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// File holding the template markup.
    #[arg(long, value_name = "PATH")]
    pub html: Option<PathBuf>,

    /// File holding the template stylesheet.
    #[arg(long, value_name = "PATH")]
    pub css: Option<PathBuf>,

    /// Comma separated.
    #[arg(long)]
    pub tags: Option<String>,

    #[arg(long)]
    pub premium: Option<bool>,

    #[arg(long)]
    pub featured: Option<bool>,

    #[arg(long)]
    pub thumbnail: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TemplatesCommand {
    /// List templates.
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Category name or all.
        #[arg(long)]
        category: Option<String>,

        /// premium, free or all.
        #[arg(long)]
        premium: Option<String>,

        /// featured, regular or all.
        #[arg(long)]
        featured: Option<String>,
    },

    /// Create a template.
    Create {
        #[command(flatten)]
        fields: TemplateFields,
    },

    /// Update a template; omitted fields keep their current value.
    Update {
        id: i64,

        #[command(flatten)]
        fields: TemplateFields,
    },

    /// Delete a template (asks first).
    Delete { id: i64 },

    /// Render a template preview.
    Preview(PreviewArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    pub id: i64,

    /// Full fidelity instead of the thumbnail.
    #[arg(long)]
    pub full: bool,

    /// Wrap the document in a sandboxed iframe page.
    #[arg(long)]
    pub framed: bool,

    /// Write to this file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Also open the full preview from the thumbnail, written here.
    #[arg(long, value_name = "PATH", requires = "out", conflicts_with = "full")]
    pub full_out: Option<PathBuf>,

    /// Re-read the template every N seconds and rewrite the file when its
    /// markup or style changes.
    #[arg(
        long,
        value_name = "SECS",
        requires = "out",
        conflicts_with_all = ["framed", "full_out"]
    )]
    pub watch: Option<u64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CategoriesCommand {
    List,

    Show { id: i64 },

    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,
    },

    Update {
        id: i64,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,
    },

    /// Delete a category (asks first).
    Delete { id: i64 },
}

#[derive(Args, Debug, Clone, Default)]
pub struct PlanFields {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub price: Option<f64>,

    #[arg(long = "months")]
    pub duration_months: Option<u32>,

    /// Repeat for each feature; order is kept.
    #[arg(long = "feature")]
    pub features: Vec<String>,

    #[arg(long)]
    pub active: Option<bool>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PlansCommand {
    List,

    Create {
        #[command(flatten)]
        fields: PlanFields,
    },

    /// Update a plan; given features replace the current list.
    Update {
        id: i64,

        #[command(flatten)]
        fields: PlanFields,
    },

    /// Delete a plan (asks first).
    Delete { id: i64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubscriptionsCommand {
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Subscription status or all.
        #[arg(long)]
        status: Option<String>,

        /// Plan id or all.
        #[arg(long)]
        plan: Option<String>,
    },

    Show { id: i64 },

    /// Turn automatic renewal on or off.
    AutoRenew {
        id: i64,

        #[arg(action = ArgAction::Set, required = true)]
        enabled: bool,
    },

    /// Cancel a subscription (asks first).
    Cancel { id: i64 },

    Renew { id: i64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum TransactionsCommand {
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Transaction status or all.
        #[arg(long)]
        status: Option<String>,
    },

    Show { id: i64 },

    /// Process a pending payment.
    Process { id: i64 },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AnalyticsCommand {
    /// Score distribution, job titles, template usage and revenue.
    Show {
        #[command(flatten)]
        page: PageArgs,

        #[arg(long)]
        job_title: Option<String>,

        #[arg(long)]
        min_score: Option<f64>,
    },

    /// One score with suggestions and keyword matches.
    Score { id: i64 },

    /// Job title synonym lookup.
    Synonyms { search: Option<String> },
}

impl Cli {
    /// Whether the stored session must be resolved before this command runs.
    /// `refresh` skips it: checking with an expired access token would take
    /// the 401 path and drop the refresh token too.
    pub fn needs_session(&self) -> bool {
        !matches!(
            self.command,
            Command::Login { .. } | Command::Logout | Command::Refresh
        )
    }
}

/// Everything a command needs once configuration is loaded.
pub struct App {
    pub gate: AuthGate,
    pub ctx: ScreenContext,
}

/// Run one command.
pub async fn run(cli: Cli, app: App) -> Result<()> {
    let confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(StdinConfirm)
    };

    match cli.command {
        Command::Login { username, password } => {
            let user = app.gate.login(&app.ctx.client, &username, &password).await?;
            println!("Signed in as {} ({})", user.username, user.email);
            Ok(())
        }
        Command::Logout => {
            app.gate.logout(&app.ctx.client)?;
            app.ctx.cache.clear();
            println!("Signed out.");
            Ok(())
        }
        Command::Refresh => {
            app.gate.refresh(&app.ctx.client).await?;
            println!("Access token refreshed.");
            Ok(())
        }
        command => {
            let user = match app.gate.require_authenticated() {
                Ok(user) => user,
                Err(GateDecision::RedirectToLogin) | Err(GateDecision::Render(_)) => {
                    bail!("Not signed in. Run `resumeit-admin login` first.")
                }
                Err(GateDecision::Wait) => bail!("Session check has not finished"),
            };
            debug!("Authenticated as {}", user.username);
            run_protected(command, &app, confirm.as_ref()).await
        }
    }
}

async fn run_protected(command: Command, app: &App, confirm: &dyn Confirm) -> Result<()> {
    let ctx = app.ctx.clone();
    match command {
        Command::Whoami => {
            if let Some(user) = app.gate.state().user() {
                output::print_whoami(user);
            }
            Ok(())
        }
        Command::Dashboard { watch } => dashboard(app, watch).await,
        Command::Users(cmd) => users(UsersScreen::new(ctx), cmd, confirm).await,
        Command::Templates(cmd) => templates(TemplatesScreen::new(ctx), cmd, confirm).await,
        Command::Categories(cmd) => categories(TemplatesScreen::new(ctx), cmd, confirm).await,
        Command::Plans(cmd) => plans(SubscriptionsScreen::new(ctx), cmd, confirm).await,
        Command::Subscriptions(cmd) => {
            subscriptions(SubscriptionsScreen::new(ctx), cmd, confirm).await
        }
        Command::Transactions(cmd) => transactions(SubscriptionsScreen::new(ctx), cmd).await,
        Command::Analytics(cmd) => analytics(AnalyticsScreen::new(ctx), cmd).await,
        Command::Login { .. } | Command::Logout | Command::Refresh => Ok(()),
    }
}

async fn dashboard(app: &App, watch: Option<u64>) -> Result<()> {
    let screen = DashboardScreen::new(app.ctx.clone());
    let Some(secs) = watch else {
        return show(screen.load().await, output::print_dashboard);
    };

    let refresher = app
        .gate
        .spawn_refresh_timer(app.ctx.client.clone(), TOKEN_REFRESH_INTERVAL);
    let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
    let result = loop {
        tokio::select! {
            _ = ticker.tick() => {
                // stale entries come back at once and refresh in the background
                if let Err(e) = show(screen.load().await, output::print_dashboard) {
                    break Err(e);
                }
                let stats = app.ctx.cache.stats();
                debug!(
                    "Cache: {} entries, {} hits, {} misses, {} background refreshes",
                    stats.size, stats.hits, stats.misses, stats.revalidations
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping dashboard watch");
                break Ok(());
            }
        }
    };
    refresher.abort();
    result
}

async fn users(screen: UsersScreen, cmd: UsersCommand, confirm: &dyn Confirm) -> Result<()> {
    match cmd {
        UsersCommand::List {
            page,
            status,
            subscription,
        } => {
            let screen = screen.with_filters(UserListParams {
                page: page.page,
                search: page.search,
                status,
                subscription,
            });
            show(screen.load().await, output::print_users)
        }
        UsersCommand::Show { id } => {
            output::print_user(&screen.user(id).await?);
            Ok(())
        }
        UsersCommand::Activity { id } => {
            show(screen.activities(id).await, output::print_activities)
        }
        UsersCommand::Create {
            username,
            email,
            password,
            first_name,
            last_name,
            staff,
            inactive,
        } => {
            let user = NewUser {
                username,
                email,
                password,
                first_name,
                last_name,
                is_active: !inactive,
                is_staff: staff,
            };
            report(screen.create(&user).await)
        }
        UsersCommand::Activate { id } => report(screen.set_active(id, true).await),
        UsersCommand::Deactivate { id } => report(screen.set_active(id, false).await),
        UsersCommand::Delete { id } => report_confirmed(screen.delete(id, confirm).await),
    }
}

async fn templates(
    screen: TemplatesScreen,
    cmd: TemplatesCommand,
    confirm: &dyn Confirm,
) -> Result<()> {
    match cmd {
        TemplatesCommand::List {
            page,
            category,
            premium,
            featured,
        } => {
            let screen = screen.with_filters(TemplateListParams {
                page: page.page,
                search: page.search,
                category,
                premium,
                featured,
            });
            show(screen.load().await, output::print_templates)
        }
        TemplatesCommand::Create { fields } => {
            let form = fields.apply(TemplateForm::default())?;
            report(screen.submit(&form, None).await?)
        }
        TemplatesCommand::Update { id, fields } => {
            let current = screen.template(id).await?;
            let form = fields.apply(TemplateForm::from_template(&current))?;
            report(screen.submit(&form, Some(id)).await?)
        }
        TemplatesCommand::Delete { id } => report_confirmed(screen.delete(id, confirm).await),
        TemplatesCommand::Preview(args) => preview(&screen, args).await,
    }
}

impl TemplateFields {
    /// Overlays the given flags on `form`, reading markup and style files.
    fn apply(self, mut form: TemplateForm) -> Result<TemplateForm> {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(description) = self.description {
            form.description = description;
        }
        if let Some(category) = self.category {
            form.category = category;
        }
        if let Some(path) = self.html {
            form.html_structure = read_file(&path)?;
        }
        if let Some(path) = self.css {
            form.css_styles = read_file(&path)?;
        }
        if let Some(tags) = self.tags {
            form.tags = tags;
        }
        if let Some(premium) = self.premium {
            form.is_premium = premium;
        }
        if let Some(featured) = self.featured {
            form.is_featured = featured;
        }
        if let Some(thumbnail) = self.thumbnail {
            form.thumbnail = thumbnail;
        }
        Ok(form)
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

async fn preview(screen: &TemplatesScreen, args: PreviewArgs) -> Result<()> {
    let template = screen.template(args.id).await?;
    let source = PreviewSource::from(&template);
    let fidelity = if args.full {
        Fidelity::Full
    } else {
        Fidelity::Thumbnail
    };

    if args.framed {
        let document =
            build_preview_document(source.markup.as_deref(), source.style.as_deref(), fidelity);
        let page = sandboxed_frame_html(&source.name, &document, fidelity);
        return match args.out {
            Some(path) => {
                std::fs::write(&path, page)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Framed preview of '{}' written to {}", source.name, path.display());
                Ok(())
            }
            None => {
                println!("{page}");
                Ok(())
            }
        };
    }

    let Some(path) = args.out else {
        let mut renderer = PreviewRenderer::new(MemorySurface::new(), source, fidelity);
        renderer.render();
        println!("{}", renderer.surface().current().unwrap_or_default());
        return Ok(());
    };

    let name = source.name.clone();
    let mut renderer = PreviewRenderer::new(FileSurface::new(path), source, fidelity);
    let written = renderer.surface().path().display().to_string();
    if renderer.render() != RenderStatus::Loaded {
        bail!("Could not write preview to {written}");
    }
    println!("Preview of '{name}' written to {written}");

    if let Some(secs) = args.watch {
        return watch_preview(screen, args.id, &mut renderer, secs).await;
    }

    if let Some(full_path) = args.full_out {
        match renderer.open_full_preview(FileSurface::new(&full_path)) {
            Some(full) if full.status() == RenderStatus::Loaded => {
                println!("Full preview written to {}", full_path.display());
            }
            Some(_) => bail!("Could not write full preview to {}", full_path.display()),
            None => println!("Already at full fidelity; --full-out ignored"),
        }
    }
    Ok(())
}

async fn watch_preview<S: PreviewSurface>(
    screen: &TemplatesScreen,
    id: i64,
    renderer: &mut PreviewRenderer<S>,
    secs: u64,
) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
    ticker.tick().await; // the first write already happened
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let status = refresh_preview(screen, id, renderer).await?;
                debug!("Preview of template {id} is {status:?}");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping preview watch");
                return Ok(());
            }
        }
    }
}

/// Re-reads the template and hands it to the renderer, which only rewrites
/// the surface when markup or style changed.
async fn refresh_preview<S: PreviewSurface>(
    screen: &TemplatesScreen,
    id: i64,
    renderer: &mut PreviewRenderer<S>,
) -> Result<RenderStatus> {
    let template = screen.reload_template(id).await?;
    Ok(renderer.update(PreviewSource::from(&template)))
}

async fn categories(
    screen: TemplatesScreen,
    cmd: CategoriesCommand,
    confirm: &dyn Confirm,
) -> Result<()> {
    match cmd {
        CategoriesCommand::List => show(screen.categories().await, output::print_categories),
        CategoriesCommand::Show { id } => {
            output::print_category(&screen.category(id).await?);
            Ok(())
        }
        CategoriesCommand::Create { name, description } => {
            let form = CategoryForm { name, description };
            report(screen.submit_category(&form, None).await?)
        }
        CategoriesCommand::Update {
            id,
            name,
            description,
        } => {
            let form = CategoryForm { name, description };
            report(screen.submit_category(&form, Some(id)).await?)
        }
        CategoriesCommand::Delete { id } => {
            report_confirmed(screen.delete_category(id, confirm).await)
        }
    }
}

impl PlanFields {
    fn apply(self, mut form: PlanForm) -> PlanForm {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(price) = self.price {
            form.price = price;
        }
        if let Some(months) = self.duration_months {
            form.duration_months = months;
        }
        if !self.features.is_empty() {
            form.features = self.features;
        } else if form.features.iter().all(String::is_empty) {
            // the dialog's placeholder row; nothing was entered
            form.features.clear();
        }
        if let Some(active) = self.active {
            form.is_active = active;
        }
        form
    }
}

async fn plans(
    screen: SubscriptionsScreen,
    cmd: PlansCommand,
    confirm: &dyn Confirm,
) -> Result<()> {
    match cmd {
        PlansCommand::List => show(screen.plans().await, output::print_plans),
        PlansCommand::Create { fields } => {
            let form = fields.apply(PlanForm::default());
            report(screen.submit_plan(&form, None).await?)
        }
        PlansCommand::Update { id, fields } => {
            let current = screen.plan(id).await?;
            let form = fields.apply(PlanForm::from_plan(&current));
            report(screen.submit_plan(&form, Some(id)).await?)
        }
        PlansCommand::Delete { id } => report_confirmed(screen.delete_plan(id, confirm).await),
    }
}

async fn subscriptions(
    screen: SubscriptionsScreen,
    cmd: SubscriptionsCommand,
    confirm: &dyn Confirm,
) -> Result<()> {
    match cmd {
        SubscriptionsCommand::List { page, status, plan } => {
            let screen = screen.with_filters(SubscriptionListParams {
                page: page.page,
                search: page.search,
                status,
                plan,
            });
            show(screen.load().await, output::print_subscriptions)
        }
        SubscriptionsCommand::Show { id } => {
            output::print_subscription(&screen.subscription(id).await?);
            Ok(())
        }
        SubscriptionsCommand::AutoRenew { id, enabled } => {
            report(screen.set_auto_renew(id, enabled).await)
        }
        SubscriptionsCommand::Cancel { id } => report_confirmed(screen.cancel(id, confirm).await),
        SubscriptionsCommand::Renew { id } => report(screen.renew(id).await),
    }
}

async fn transactions(screen: SubscriptionsScreen, cmd: TransactionsCommand) -> Result<()> {
    match cmd {
        TransactionsCommand::List { page, status } => {
            let screen = screen.with_transaction_filters(TransactionListParams {
                page: page.page,
                search: page.search,
                status,
            });
            show(screen.transactions().await, output::print_transactions)
        }
        TransactionsCommand::Show { id } => {
            output::print_transaction(&screen.transaction(id).await?);
            Ok(())
        }
        TransactionsCommand::Process { id } => report(screen.process_payment(id).await),
    }
}

async fn analytics(screen: AnalyticsScreen, cmd: AnalyticsCommand) -> Result<()> {
    match cmd {
        AnalyticsCommand::Show {
            page,
            job_title,
            min_score,
        } => {
            let screen = screen.with_filters(AtsScoreListParams {
                page: page.page,
                search: page.search,
                job_title,
                min_score,
            });
            show(screen.load().await, output::print_analytics)
        }
        AnalyticsCommand::Score { id } => {
            let details = screen.score_details(id).await?;
            output::print_score_details(&details);
            Ok(())
        }
        AnalyticsCommand::Synonyms { search } => show(
            screen.synonyms(search.as_deref()).await,
            output::print_synonyms,
        ),
    }
}

/// Prints a view, or turns a failed one into the command's error.
fn show<T>(state: ViewState<T>, print: impl FnOnce(&T)) -> Result<()> {
    match state {
        ViewState::Loading => {
            println!("Loading...");
            Ok(())
        }
        ViewState::Empty(message) => {
            println!("{message}");
            Ok(())
        }
        ViewState::Ready(value) => {
            print(&value);
            Ok(())
        }
        ViewState::Failed { message, can_retry } => {
            if can_retry {
                bail!("{message} (run the command again to retry)")
            }
            bail!("{message}")
        }
    }
}

fn report(notification: Notification) -> Result<()> {
    match notification {
        Notification::Success(message) => {
            println!("{message}");
            Ok(())
        }
        Notification::Failure(message) => bail!("{message}"),
    }
}

fn report_confirmed(notification: Option<Notification>) -> Result<()> {
    match notification {
        Some(notification) => report(notification),
        None => {
            println!("Cancelled.");
            Ok(())
        }
    }
}
