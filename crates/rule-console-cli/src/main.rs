// crates/rule-console-cli/src/main.rs
// ============================================================================
// Module: Rule Console CLI Entry Point
// Description: Command dispatcher for sign-in and rule management.
// Purpose: Drive the rule controllers against a live control plane.
// Dependencies: clap, rule-console-client, rule-console-config, rule-console-core, serde, thiserror, tokio.
// ============================================================================

//! ## Overview
//! The rule console CLI signs in to the control plane and lists, creates,
//! updates, and deletes rules of any kind for one application. Rule payloads
//! are read from JSON files and results are written to stdout as JSON.
//! Session cookies live only as long as the process, so rule commands accept
//! `--username`/`--password` to sign in before they run.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use rule_console_client::ApiAuditSink;
use rule_console_client::ApiClient;
use rule_console_client::ApiClientConfig;
use rule_console_client::ApiFileAuditSink;
use rule_console_client::ApiStderrAuditSink;
use rule_console_client::AuthApi;
use rule_console_client::FileSessionStore;
use rule_console_client::MemoryNavigator;
use rule_console_client::MemorySessionStore;
use rule_console_client::Navigator;
use rule_console_client::SessionStore;
use rule_console_client::UnauthorizedHandler;
use rule_console_config::ConsoleConfig;
use rule_console_core::AuthorityRule;
use rule_console_core::CreateController;
use rule_console_core::DegradeRule;
use rule_console_core::EditController;
use rule_console_core::FlowRule;
use rule_console_core::FormContext;
use rule_console_core::Identified;
use rule_console_core::ListController;
use rule_console_core::ListView;
use rule_console_core::NewTabContext;
use rule_console_core::ParamFlowRule;
use rule_console_core::RemoteUserProvider;
use rule_console_core::RuleApi;
use rule_console_core::RuleId;
use rule_console_core::RuleKind;
use rule_console_core::RuleResource;
use rule_console_core::RuleSpec;
use rule_console_core::SessionGate;
use rule_console_core::SystemRule;
use rule_console_core::paths;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a rule JSON input.
const MAX_RULE_INPUT_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "rule-console", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (overrides `RULE_CONSOLE_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in to the control plane.
    Login(LoginCommand),
    /// Sign out and clear the local session.
    Logout,
    /// Print the signed-in user.
    Whoami,
    /// Rule management.
    Rules {
        /// Selected rules subcommand.
        #[command(subcommand)]
        command: RulesCommand,
    },
}

/// Arguments for `login`.
#[derive(Args, Debug)]
struct LoginCommand {
    /// User name.
    #[arg(long)]
    username: String,
    /// Password.
    #[arg(long)]
    password: String,
}

/// Optional sign-in performed before a rule command.
#[derive(Args, Debug, Clone, Default)]
struct Credentials {
    /// User name to sign in with first.
    #[arg(long, requires = "password")]
    username: Option<String>,
    /// Password to sign in with first.
    #[arg(long, requires = "username")]
    password: Option<String>,
}

impl Credentials {
    /// Returns the user name and password when both were given.
    fn pair(&self) -> Option<(&str, &str)> {
        Some((self.username.as_deref()?, self.password.as_deref()?))
    }
}

/// Rule kind and owning application.
#[derive(Args, Debug, Clone)]
struct RuleTarget {
    /// Rule kind: flow, degrade, paramFlow (or param-flow), system, authority.
    #[arg(long, value_name = "KIND")]
    kind: RuleKind,
    /// Application name.
    #[arg(long, value_name = "APP")]
    app: String,
}

/// Rules subcommands.
#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// List rules with optional search and paging.
    List(RulesListCommand),
    /// Create a rule from a JSON file.
    Create(RulesCreateCommand),
    /// Replace a rule's fields from a JSON file.
    Update(RulesUpdateCommand),
    /// Delete a rule.
    Delete(RulesDeleteCommand),
}

impl RulesCommand {
    /// Returns the targeted kind and application.
    const fn target(&self) -> &RuleTarget {
        match self {
            Self::List(command) => &command.target,
            Self::Create(command) => &command.target,
            Self::Update(command) => &command.target,
            Self::Delete(command) => &command.target,
        }
    }

    /// Returns the sign-in credentials.
    const fn credentials(&self) -> &Credentials {
        match self {
            Self::List(command) => &command.credentials,
            Self::Create(command) => &command.credentials,
            Self::Update(command) => &command.credentials,
            Self::Delete(command) => &command.credentials,
        }
    }
}

/// Arguments for `rules list`.
#[derive(Args, Debug)]
struct RulesListCommand {
    /// Kind and application.
    #[command(flatten)]
    target: RuleTarget,
    /// Sign-in credentials.
    #[command(flatten)]
    credentials: Credentials,
    /// Search keyword.
    #[arg(long, default_value = "")]
    keyword: String,
    /// Page to print, 1-based.
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Rows per page (defaults to `list.page_size`).
    #[arg(long)]
    page_size: Option<usize>,
}

/// Arguments for `rules create`.
#[derive(Args, Debug)]
struct RulesCreateCommand {
    /// Kind and application.
    #[command(flatten)]
    target: RuleTarget,
    /// Sign-in credentials.
    #[command(flatten)]
    credentials: Credentials,
    /// JSON file holding the rule fields.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
}

/// Arguments for `rules update`.
#[derive(Args, Debug)]
struct RulesUpdateCommand {
    /// Kind and application.
    #[command(flatten)]
    target: RuleTarget,
    /// Sign-in credentials.
    #[command(flatten)]
    credentials: Credentials,
    /// Id of the rule to update.
    #[arg(long)]
    id: String,
    /// JSON file holding the new rule fields.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
}

/// Arguments for `rules delete`.
#[derive(Args, Debug)]
struct RulesDeleteCommand {
    /// Kind and application.
    #[command(flatten)]
    target: RuleTarget,
    /// Sign-in credentials.
    #[command(flatten)]
    credentials: Credentials,
    /// Id of the rule to delete.
    #[arg(long)]
    id: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let console = Console::open(cli.config.as_deref())?;
    match cli.command {
        Commands::Login(command) => command_login(&console, &command).await,
        Commands::Logout => command_logout(&console).await,
        Commands::Whoami => command_whoami(&console).await,
        Commands::Rules {
            command,
        } => command_rules(&console, command).await,
    }
}

// ============================================================================
// SECTION: Console Wiring
// ============================================================================

/// Clears the local session when the control plane reports expiry.
struct ClearSession {
    /// Session to clear.
    session: Arc<dyn SessionStore>,
}

impl UnauthorizedHandler for ClearSession {
    fn on_unauthorized(&self) {
        if let Err(err) = self.session.clear() {
            let _ = write_stderr_line(&format!("failed to clear session after 401: {err}"));
        }
    }
}

/// Collaborators built from configuration.
struct Console {
    /// Loaded configuration.
    config: ConsoleConfig,
    /// Shared HTTP client.
    client: ApiClient,
    /// Authentication endpoints.
    auth: AuthApi,
}

impl Console {
    /// Loads configuration and builds the client stack.
    fn open(config_path: Option<&Path>) -> CliResult<Self> {
        let config = ConsoleConfig::load(config_path)
            .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
        let session: Arc<dyn SessionStore> = match &config.session.path {
            Some(path) => Arc::new(FileSessionStore::new(path)),
            None => Arc::new(MemorySessionStore::default()),
        };
        let handler = Arc::new(ClearSession {
            session: Arc::clone(&session),
        });
        let mut api_config = ApiClientConfig::new(config.api.base_url.clone());
        api_config.timeout = config.api.timeout();
        api_config.max_response_bytes = config.api.max_response_bytes;
        let mut client =
            ApiClient::new(api_config, handler).map_err(|err| CliError::new(err.to_string()))?;
        if config.audit.enabled {
            let sink: Arc<dyn ApiAuditSink> = match &config.audit.path {
                Some(path) => Arc::new(ApiFileAuditSink::new(path).map_err(|err| {
                    CliError::new(format!("failed to open audit log {}: {err}", path.display()))
                })?),
                None => Arc::new(ApiStderrAuditSink),
            };
            client = client.with_audit_sink(sink);
        }
        let auth = AuthApi::new(client.clone(), session);
        Ok(Self {
            config,
            client,
            auth,
        })
    }

    /// Builds the form collaborators for a screen at `location`.
    fn form_context(&self, kind: RuleKind, location: &str) -> FormContext {
        let navigator: Arc<dyn Navigator> = Arc::new(MemoryNavigator::at(location));
        FormContext::new(
            kind,
            Arc::new(RemoteUserProvider::new(self.auth.clone())),
            navigator,
            NewTabContext::same_tab(),
        )
    }
}

// ============================================================================
// SECTION: Session Commands
// ============================================================================

/// Executes `login`.
async fn command_login(console: &Console, command: &LoginCommand) -> CliResult<ExitCode> {
    console
        .auth
        .login(&command.username, &command.password)
        .await
        .map_err(|err| CliError::new(format!("sign-in failed: {err}")))?;
    write_stdout_line(&format!("signed in as {}", command.username))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `logout`.
async fn command_logout(console: &Console) -> CliResult<ExitCode> {
    console
        .auth
        .logout()
        .await
        .map_err(|err| CliError::new(format!("sign-out failed: {err}")))?;
    write_stdout_line("signed out").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `whoami`.
async fn command_whoami(console: &Console) -> CliResult<ExitCode> {
    let user = console
        .auth
        .current_user()
        .await
        .map_err(|err| CliError::new(format!("not signed in: {err}")))?;
    write_json(&user)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Rule Commands
// ============================================================================

/// One page of rules as printed by `rules list`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RulePage<'a, R> {
    /// Current page, 1-based.
    page: usize,
    /// Rows per page.
    page_size: usize,
    /// Number of matching rules.
    total: usize,
    /// Rules on the page.
    items: &'a [Identified<R>],
}

/// Executes `rules`, dispatching on the rule kind.
async fn command_rules(console: &Console, command: RulesCommand) -> CliResult<ExitCode> {
    match command.target().kind {
        RuleKind::Flow => run_rules::<FlowRule>(console, command).await,
        RuleKind::Degrade => run_rules::<DegradeRule>(console, command).await,
        RuleKind::ParamFlow => run_rules::<ParamFlowRule>(console, command).await,
        RuleKind::System => run_rules::<SystemRule>(console, command).await,
        RuleKind::Authority => run_rules::<AuthorityRule>(console, command).await,
    }
}

/// Runs a rules subcommand for payload type `R`.
async fn run_rules<R: RuleSpec>(console: &Console, command: RulesCommand) -> CliResult<ExitCode> {
    if let Some((username, password)) = command.credentials().pair() {
        console
            .auth
            .login(username, password)
            .await
            .map_err(|err| CliError::new(format!("sign-in failed: {err}")))?;
    }
    let api = RuleResource::<R>::new(console.client.clone());
    match command {
        RulesCommand::List(command) => rules_list(console, api, &command).await,
        RulesCommand::Create(command) => rules_create(console, api, &command).await,
        RulesCommand::Update(command) => rules_update(console, api, &command).await,
        RulesCommand::Delete(command) => rules_delete(api, &command).await,
    }
}

/// Executes `rules list`.
async fn rules_list<R: RuleSpec>(
    console: &Console,
    api: RuleResource<R>,
    command: &RulesListCommand,
) -> CliResult<ExitCode> {
    let page_size = command.page_size.unwrap_or(console.config.list.page_size);
    let mut list =
        ListController::new(api, Some(&command.target.app), search_fields(R::KIND), page_size);
    list.refresh().await.map_err(|err| CliError::new(format!("failed to list rules: {err}")))?;
    list.set_keyword(&command.keyword);
    list.set_page(command.page);
    match list.view() {
        ListView::Rows(rows) => write_json(&RulePage {
            page: rows.page,
            page_size: rows.page_size,
            total: rows.total,
            items: &rows.items,
        })?,
        ListView::Empty | ListView::NoResults => write_json(&RulePage::<R> {
            page: command.page.max(1),
            page_size: page_size.max(1),
            total: 0,
            items: &[],
        })?,
        ListView::AppRequired => {
            return Err(CliError::new("an application name is required".to_string()));
        }
        ListView::Loading => return Err(CliError::new("rule list was not loaded".to_string())),
        ListView::Failed {
            message, ..
        } => return Err(CliError::new(format!("failed to list rules: {message}"))),
    }
    Ok(ExitCode::SUCCESS)
}

/// Executes `rules create`.
async fn rules_create<R: RuleSpec>(
    console: &Console,
    api: RuleResource<R>,
    command: &RulesCreateCommand,
) -> CliResult<ExitCode> {
    let app = command.target.app.as_str();
    let draft: R = read_rule_json(&command.input, app)?;
    let context = console.form_context(R::KIND, &paths::create_path(R::KIND, app));
    let mut create = CreateController::new(api, context, Some(app));
    require_signed_in(create.resolve_session().await)?;
    let created = create
        .submit(draft)
        .await
        .map_err(|err| CliError::new(format!("failed to create rule: {err}")))?;
    write_json(&created)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `rules update`.
async fn rules_update<R: RuleSpec>(
    console: &Console,
    api: RuleResource<R>,
    command: &RulesUpdateCommand,
) -> CliResult<ExitCode> {
    let app = command.target.app.as_str();
    let draft: R = read_rule_json(&command.input, app)?;
    let context = console.form_context(R::KIND, &paths::edit_path(R::KIND, app, &command.id));
    let mut edit = EditController::new(api, context, Some(app), Some(&command.id));
    require_signed_in(edit.resolve_session().await)?;
    edit.load().await.map_err(|err| CliError::new(format!("failed to load rule: {err}")))?;
    if edit.resolved().is_none() {
        return Err(CliError::new(format!("rule {} not found in {app}", command.id)));
    }
    let updated = edit
        .submit(draft)
        .await
        .map_err(|err| CliError::new(format!("failed to update rule: {err}")))?;
    write_json(&updated)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `rules delete`; only ids present in the application's list are deleted.
async fn rules_delete<R: RuleSpec>(
    api: RuleResource<R>,
    command: &RulesDeleteCommand,
) -> CliResult<ExitCode> {
    let app = command.target.app.as_str();
    let id: RuleId = command
        .id
        .parse()
        .map_err(|err| CliError::new(format!("invalid rule id {}: {err}", command.id)))?;
    let rules = api
        .get_rules(app)
        .await
        .map_err(|err| CliError::new(format!("failed to list rules: {err}")))?;
    if !rules.iter().any(|rule| rule.id() == id) {
        return Err(CliError::new(format!("rule {id} not found in {app}")));
    }
    api.delete_rule(id).await.map_err(|err| CliError::new(format!("failed to delete rule: {err}")))?;
    write_stdout_line(&format!("deleted {} rule {id}", R::KIND))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Fails unless the session gate passed.
fn require_signed_in(gate: &SessionGate) -> CliResult<()> {
    if gate.is_signed_in() {
        Ok(())
    } else {
        Err(CliError::new(
            "not signed in; pass --username and --password to sign in first".to_string(),
        ))
    }
}

/// Fields searched by `rules list --keyword` for `kind`.
const fn search_fields(kind: RuleKind) -> &'static [&'static str] {
    match kind {
        RuleKind::System => &[],
        RuleKind::Flow | RuleKind::ParamFlow | RuleKind::Authority => &["resource", "limitApp"],
        RuleKind::Degrade => &["resource"],
    }
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Reads a rule payload for `app` from a JSON file.
///
/// Fields missing from the file keep the kind defaults. A missing `app`
/// field takes the command's application; a different one is rejected. Any
/// `id` field is ignored.
fn read_rule_json<R: RuleSpec>(path: &Path, app: &str) -> CliResult<R> {
    let bytes = read_bytes_with_limit(path, MAX_RULE_INPUT_BYTES)?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("invalid JSON in {}: {err}", path.display())))?;
    let Value::Object(mut fields) = value else {
        return Err(CliError::new(format!("{} must hold a JSON object", path.display())));
    };
    fields.remove("id");
    if let Some(found) = fields.get("app").and_then(Value::as_str) {
        if found != app {
            return Err(CliError::new(format!("rule belongs to {found}, not {app}")));
        }
    }
    let mut merged = serde_json::to_value(R::draft(app))
        .map_err(|err| CliError::new(format!("failed to build {} draft: {err}", R::KIND)))?;
    if let Value::Object(base) = &mut merged {
        base.extend(fields);
    }
    serde_json::from_value(merged)
        .map_err(|err| CliError::new(format!("invalid {} rule: {err}", R::KIND)))
}

/// Reads a file, failing when it exceeds `max_bytes`.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> CliResult<Vec<u8>> {
    let read_error =
        |err: std::io::Error| CliError::new(format!("failed to read {}: {err}", path.display()));
    let file = File::open(path).map_err(read_error)?;
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(read_error)?;
    if bytes.len() > max_bytes {
        return Err(CliError::new(format!(
            "{} exceeds size limit ({max_bytes} bytes)",
            path.display()
        )));
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a value as pretty JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render JSON: {err}")))?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
