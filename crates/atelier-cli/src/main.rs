//! Atelier CLI - project manager for architecture firms

use atelier_core::application::{
    CONTACT_FIELDS, ContactForm, ContactService, DocumentPicker, Field, FixedPath, PROJECT_FIELDS,
    ProjectForm, ProjectService, ProjectView, RoleSlot, TaskView, field_labels, row_values,
    sort_by_field,
};
use atelier_core::commands::{Contact, Role};
use atelier_core::config::Config;
use atelier_core::storage::Database;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[cfg(test)]
mod main_tests;

#[derive(Parser)]
#[command(name = "atelier")]
#[command(author, version, about = "Project manager for architecture firms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Database file (overrides the configured path)
    #[arg(long, global = true, env = "ATELIER_DB_PATH")]
    db: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and seed stages and tasks
    Init,

    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage contacts
    Contacts {
        #[command(subcommand)]
        action: ContactAction,
    },

    /// Manage contact roles on a project
    Roles {
        #[command(subcommand)]
        action: RoleAction,
    },

    /// Workflow stages
    Stages {
        #[command(subcommand)]
        action: StageAction,
    },

    /// Project checklists
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

/// Contact names for the five role slots
#[derive(clap::Args, Default)]
struct RoleArgs {
    /// Customer name, "First Last" (repeat for Customer 2)
    #[arg(long = "customer")]
    customers: Vec<String>,
    /// Constructor name
    #[arg(long)]
    constructor: Option<String>,
    /// Inspector name
    #[arg(long)]
    inspector: Option<String>,
    /// Consultant name
    #[arg(long)]
    consultant: Option<String>,
}

#[derive(Subcommand)]
enum ProjectAction {
    /// List projects
    List {
        /// Filter by location substring
        #[arg(short, long, default_value = "")]
        search: String,
        /// Only active projects
        #[arg(long, conflicts_with = "all")]
        active: bool,
        /// Include finished projects even if config hides them
        #[arg(long)]
        all: bool,
        /// Sort by column (Location, Start Date, End Date, Active, Document Path, Stage)
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Show project details
    Show { id: i64 },
    /// Create a project
    New {
        location: String,
        /// Start date (defaults to today)
        #[arg(long)]
        start: Option<String>,
        /// End date, kept only for finished projects
        #[arg(long)]
        end: Option<String>,
        /// Create the project as finished
        #[arg(long)]
        inactive: bool,
        /// Stage name
        #[arg(long)]
        stage: Option<String>,
        /// Document path
        #[arg(long)]
        document: Option<String>,
        #[command(flatten)]
        roles: RoleArgs,
    },
    /// Update a project; omitted fields keep their value
    Update {
        id: i64,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// true or false; setting true clears the end date
        #[arg(long)]
        active: Option<bool>,
        /// Stage name, empty to clear
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        document: Option<String>,
        /// Replace the role slots with the given names
        #[arg(long)]
        replace_roles: bool,
        #[command(flatten)]
        roles: RoleArgs,
    },
    /// Delete a project with its roles and checklist progress
    Delete {
        id: i64,
        #[arg(long)]
        force: bool,
    },
    /// Attach a document to a project
    Document {
        id: i64,
        /// Path to store; prompts when omitted
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ContactAction {
    /// List contacts
    List {
        /// Filter by first or last name substring
        #[arg(short, long, default_value = "")]
        search: String,
        /// Sort by column (First Name, Last Name, Phone, Email, Address)
        #[arg(long)]
        sort: Option<String>,
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Show contact details and linked projects
    Show { id: i64 },
    /// Create a contact
    New {
        first_name: String,
        last_name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        address: String,
    },
    /// Update a contact; omitted fields keep their value
    Update {
        id: i64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Delete a contact and its role assignments
    Delete {
        id: i64,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum RoleAction {
    /// List role assignments of a project
    List { project_id: i64 },
    /// Assign a contact to a project
    Add {
        project_id: i64,
        contact_id: i64,
        /// Customer, Inspector, Constructor or Consultant
        role: Role,
    },
    /// Remove a role assignment by its id
    Remove { role_id: i64 },
    /// Remove the customer shown as Customer 1 or Customer 2
    RemoveCustomer {
        project_id: i64,
        #[arg(value_parser = clap::value_parser!(u8).range(1..=2))]
        slot: u8,
    },
}

#[derive(Subcommand)]
enum StageAction {
    /// List stages with their tasks
    List,
}

#[derive(Subcommand)]
enum TaskAction {
    /// Show a project's checklist
    List {
        project_id: i64,
        /// Stage name (defaults to the project's stage, or every stage)
        #[arg(long, conflicts_with = "all")]
        stage: Option<String>,
        /// Every stage
        #[arg(long)]
        all: bool,
    },
    /// Mark tasks done
    Done {
        project_id: i64,
        #[arg(required = true)]
        task_ids: Vec<i64>,
    },
    /// Mark tasks not done
    Undone {
        project_id: i64,
        #[arg(required = true)]
        task_ids: Vec<i64>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show configuration file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries command output only
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("atelier=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        report_error(&err);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let out = Output {
        format: cli.format,
        quiet: cli.quiet,
    };
    let db_path = cli.db.as_deref();

    match cli.command {
        Commands::Init => cmd_init(db_path, out).await,

        Commands::Projects { action } => {
            let config = Config::load()?;
            let db = open_db(&config, db_path).await?;
            cmd_projects(&db, &config, action, out).await
        }

        Commands::Contacts { action } => {
            let db = open_db(&Config::load()?, db_path).await?;
            cmd_contacts(&db, action, out).await
        }

        Commands::Roles { action } => {
            let db = open_db(&Config::load()?, db_path).await?;
            cmd_roles(&db, action, out).await
        }

        Commands::Stages { action } => {
            let db = open_db(&Config::load()?, db_path).await?;
            cmd_stages(&db, action, out).await
        }

        Commands::Tasks { action } => {
            let db = open_db(&Config::load()?, db_path).await?;
            cmd_tasks(&db, action, out).await
        }

        Commands::Config { action } => cmd_config(action, out),

        Commands::Doctor => cmd_doctor(db_path, out).await,
    }
}

/// Print an error with its code and hint when it comes from the core
fn report_error(err: &anyhow::Error) {
    match err.downcast_ref::<atelier_core::Error>() {
        Some(core) => {
            eprintln!("Error [{}]: {}", core.code(), core);
            if let Some(suggestion) = core.suggestion() {
                eprintln!("  Try: {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", err),
    }
}

async fn open_db(config: &Config, override_path: Option<&Path>) -> anyhow::Result<Database> {
    let db_config = config.database_config(override_path);
    debug!(path = %db_config.path.display(), "Opening database");
    Database::new(db_config).await
}

#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Emit a value as JSON; returns false in text mode
    fn emit<T: Serialize>(&self, value: &T) -> anyhow::Result<bool> {
        if !self.json() {
            return Ok(false);
        }
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(true)
    }

    /// Status line, hidden in quiet and JSON modes
    fn note(&self, message: impl AsRef<str>) {
        if !self.quiet && !self.json() {
            println!("{}", message.as_ref());
        }
    }
}

fn print_table<T>(rows: &[T], id: fn(&T) -> i64, fields: &[Field<T>]) {
    println!("{:>4}  {}", "ID", field_labels(fields).join(" | "));
    for row in rows {
        println!("{:>4}  {}", id(row), row_values(row, fields).join(" | "));
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_init(db_path: Option<&Path>, out: Output) -> anyhow::Result<()> {
    let config = Config::load()?;
    let db = open_db(&config, db_path).await?;
    let (stages, tasks) = db.reference_counts().await?;

    if out.emit(&serde_json::json!({
        "path": db.path().display().to_string(),
        "stages": stages,
        "tasks": tasks,
    }))? {
        return Ok(());
    }

    out.note(format!("Database ready: {}", db.path().display()));
    out.note(format!("  Stages: {}", stages));
    out.note(format!("  Tasks: {}", tasks));
    Ok(())
}

fn apply_roles(form: &mut ProjectForm, roles: RoleArgs, replace: bool) -> anyhow::Result<()> {
    if roles.customers.len() > 2 {
        return Err(atelier_core::Error::InvalidInput(
            "At most two customers can be assigned".to_string(),
        )
        .into());
    }

    if replace {
        form.roles = Default::default();
    }

    for (position, name) in roles.customers.into_iter().enumerate() {
        if let Some(slot) = RoleSlot::customer(position) {
            form.roles.set(slot, name);
        }
    }
    let others = [
        (RoleSlot::Constructor, roles.constructor),
        (RoleSlot::Inspector, roles.inspector),
        (RoleSlot::Consultant, roles.consultant),
    ];
    for (slot, name) in others {
        if let Some(name) = name {
            form.roles.set(slot, name);
        }
    }
    Ok(())
}

fn print_project(view: &ProjectView) {
    println!("Project: {}", view.display_name());
    println!("  ID: {}", view.id);
    for (field, value) in PROJECT_FIELDS.iter().map(|f| (f.label, (f.value)(view))) {
        if !value.is_empty() {
            println!("  {}: {}", field, value);
        }
    }
    println!("  Roles:");
    for (label, name) in view.roles.iter() {
        let name = if name.is_empty() { "-" } else { name };
        println!("    {}: {}", label, name);
    }
}

fn print_checklist(stage_name: &str, tasks: &[TaskView]) {
    println!("{}", stage_name);
    for task in tasks {
        let mark = if task.is_done { "x" } else { " " };
        println!("  [{}] {:>3}  {}", mark, task.id, task.description);
    }
}

async fn cmd_projects(
    db: &Database,
    config: &Config,
    action: ProjectAction,
    out: Output,
) -> anyhow::Result<()> {
    let service = ProjectService::new(db);

    match action {
        ProjectAction::List {
            search,
            active,
            all,
            sort,
            desc,
        } => {
            let active_only = active || (config.projects.active_only && !all);
            let mut views = service.list_project_views(&search, active_only).await?;
            if let Some(column) = sort {
                sort_by_field(&mut views, PROJECT_FIELDS, &column, desc)?;
            }

            if out.emit(&views)? {
                return Ok(());
            }
            if views.is_empty() {
                out.note("No projects found.");
                out.note("\nCreate one with: atelier projects new <location>");
                return Ok(());
            }
            print_table(&views, |v| v.id, PROJECT_FIELDS);
        }

        ProjectAction::Show { id } => {
            let view = service
                .build_project_view(id)
                .await?
                .ok_or(atelier_core::Error::ProjectNotFound(id))?;
            let checklist = match view.stage_id {
                Some(stage_id) => service.task_views_for_stage(id, stage_id).await?,
                None => Vec::new(),
            };

            if out.emit(&serde_json::json!({ "project": view, "tasks": checklist }))? {
                return Ok(());
            }
            print_project(&view);
            if !checklist.is_empty() {
                println!();
                print_checklist(&view.stage_name, &checklist);
            }
        }

        ProjectAction::New {
            location,
            start,
            end,
            inactive,
            stage,
            document,
            roles,
        } => {
            let mut form = ProjectForm::blank();
            form.location = location;
            if let Some(start) = start {
                form.start_date = start;
            }
            form.set_active(!inactive);
            if let Some(end) = end {
                if inactive {
                    form.end_date = end;
                } else {
                    warn!("End date ignored for an active project");
                }
            }
            form.stage_name = stage.unwrap_or_default();
            form.document_path = document.unwrap_or_default();
            apply_roles(&mut form, roles, true)?;

            let id = service.create_from_form(&form).await?;

            if out.emit(&serde_json::json!({ "id": id }))? {
                return Ok(());
            }
            out.note("Project created successfully!");
            println!("  ID: {}", id);
        }

        ProjectAction::Update {
            id,
            location,
            start,
            end,
            active,
            stage,
            document,
            replace_roles,
            roles,
        } => {
            let view = service
                .build_project_view(id)
                .await?
                .ok_or(atelier_core::Error::ProjectNotFound(id))?;
            let mut form = ProjectForm::from_view(&view);

            if let Some(location) = location {
                form.location = location;
            }
            if let Some(start) = start {
                form.start_date = start;
            }
            if let Some(active) = active {
                form.set_active(active);
            }
            if let Some(end) = end {
                if form.active {
                    warn!("End date ignored for an active project");
                } else {
                    form.end_date = end;
                }
            }
            if let Some(stage) = stage {
                form.stage_name = stage;
            }
            if let Some(document) = document {
                form.document_path = document;
            }
            apply_roles(&mut form, roles, replace_roles)?;

            if replace_roles {
                service.replace_form(id, &form).await?;
            } else {
                service.save_form(id, &form).await?;
            }

            if out.emit(&serde_json::json!({ "id": id, "updated": true }))? {
                return Ok(());
            }
            out.note(format!("Project {} updated.", id));
        }

        ProjectAction::Delete { id, force } => {
            if !force {
                if !out.quiet {
                    println!("Warning: This will permanently delete project {}.", id);
                    println!("Use --force to confirm deletion.");
                }
                return Ok(());
            }
            service.delete_project(id).await?;
            if out.emit(&serde_json::json!({ "id": id, "deleted": true }))? {
                return Ok(());
            }
            out.note(format!("Project {} permanently deleted.", id));
        }

        ProjectAction::Document { id, path } => {
            let stored = match path {
                Some(path) => service.attach_document(id, &mut FixedPath::new(path)).await?,
                None => {
                    let mut picker = prompt_picker();
                    service.attach_document(id, &mut picker).await?
                }
            };

            if out.emit(&serde_json::json!({ "id": id, "document_path": stored }))? {
                return Ok(());
            }
            match stored {
                Some(path) => out.note(format!("Document attached: {}", path)),
                None => out.note("No document selected."),
            }
        }
    }
    Ok(())
}

/// Picker that reads a path from the terminal; an empty line cancels
fn prompt_picker() -> impl DocumentPicker {
    || -> atelier_core::Result<Option<PathBuf>> {
        use rustyline::error::ReadlineError;

        let mut editor = rustyline::DefaultEditor::new()
            .map_err(|e| atelier_core::Error::Other(format!("Could not open prompt: {}", e)))?;

        match editor.readline("Document path: ") {
            Ok(line) => {
                let line = line.trim();
                Ok((!line.is_empty()).then(|| PathBuf::from(line)))
            }
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => Err(atelier_core::Error::UserCancelled),
            Err(ReadlineError::Io(e)) => Err(e.into()),
            Err(e) => Err(atelier_core::Error::Other(format!("Prompt failed: {}", e))),
        }
    }
}

async fn cmd_contacts(db: &Database, action: ContactAction, out: Output) -> anyhow::Result<()> {
    let service = ContactService::new(db);

    match action {
        ContactAction::List { search, sort, desc } => {
            let mut contacts = service.list_contacts(&search).await?;
            if let Some(column) = sort {
                sort_by_field(&mut contacts, CONTACT_FIELDS, &column, desc)?;
            }

            if out.emit(&contacts)? {
                return Ok(());
            }
            if contacts.is_empty() {
                out.note("No contacts found.");
                out.note("\nCreate one with: atelier contacts new <first-name> <last-name>");
                return Ok(());
            }
            print_table(&contacts, |c: &Contact| c.id, CONTACT_FIELDS);
        }

        ContactAction::Show { id } => {
            let contact = service
                .get_contact(id)
                .await?
                .ok_or(atelier_core::Error::ContactNotFound(id))?;
            let linked = service.linked_projects(id).await?;

            if out.emit(&serde_json::json!({ "contact": contact, "projects": linked }))? {
                return Ok(());
            }
            println!("Contact: {}", contact.display_name());
            println!("  ID: {}", contact.id);
            for field in CONTACT_FIELDS {
                let value = (field.value)(&contact);
                if !value.is_empty() {
                    println!("  {}: {}", field.label, value);
                }
            }
            if linked.is_empty() {
                println!("  Projects: none");
            } else {
                println!("  Projects:");
                for project in linked {
                    println!(
                        "    {:>4}  {} ({})",
                        project.project_id, project.display_name, project.role
                    );
                }
            }
        }

        ContactAction::New {
            first_name,
            last_name,
            phone,
            email,
            address,
        } => {
            let form = ContactForm {
                first_name,
                last_name,
                phone,
                email,
                address,
            };
            let id = service.create_from_form(&form).await?;

            if out.emit(&serde_json::json!({ "id": id }))? {
                return Ok(());
            }
            out.note("Contact created successfully!");
            println!("  ID: {}", id);
        }

        ContactAction::Update {
            id,
            first_name,
            last_name,
            phone,
            email,
            address,
        } => {
            let contact = service
                .get_contact(id)
                .await?
                .ok_or(atelier_core::Error::ContactNotFound(id))?;
            let mut form = ContactForm::from_contact(&contact);
            let edits = [
                (&mut form.first_name, first_name),
                (&mut form.last_name, last_name),
                (&mut form.phone, phone),
                (&mut form.email, email),
                (&mut form.address, address),
            ];
            for (field, value) in edits {
                if let Some(value) = value {
                    *field = value;
                }
            }
            service.save_form(id, &form).await?;

            if out.emit(&serde_json::json!({ "id": id, "updated": true }))? {
                return Ok(());
            }
            out.note(format!("Contact {} updated.", id));
        }

        ContactAction::Delete { id, force } => {
            if !force {
                if !out.quiet {
                    println!("Warning: This will permanently delete contact {}.", id);
                    println!("Use --force to confirm deletion.");
                }
                return Ok(());
            }
            service.delete_contact(id).await?;
            if out.emit(&serde_json::json!({ "id": id, "deleted": true }))? {
                return Ok(());
            }
            out.note(format!("Contact {} permanently deleted.", id));
        }
    }
    Ok(())
}

async fn cmd_roles(db: &Database, action: RoleAction, out: Output) -> anyhow::Result<()> {
    let service = ProjectService::new(db);
    let contacts = ContactService::new(db);

    match action {
        RoleAction::List { project_id } => {
            let view = service
                .build_project_view(project_id)
                .await?
                .ok_or(atelier_core::Error::ProjectNotFound(project_id))?;
            let rows = service.list_project_roles(project_id).await?;

            if out.emit(&serde_json::json!({ "slots": view.roles, "assignments": rows }))? {
                return Ok(());
            }
            out.note(format!("Roles for {}:", view.display_name()));
            if rows.is_empty() {
                out.note("  (none)");
            }
            for row in rows {
                let name = contacts
                    .get_contact(row.contact_id)
                    .await?
                    .map(|c| c.display_name())
                    .unwrap_or_else(|| format!("<missing contact {}>", row.contact_id));
                println!("{:>4}  {:<12} {}", row.id, row.role.as_str(), name);
            }
        }

        RoleAction::Add {
            project_id,
            contact_id,
            role,
        } => {
            if service.get_project(project_id).await?.is_none() {
                return Err(atelier_core::Error::ProjectNotFound(project_id).into());
            }
            if contacts.get_contact(contact_id).await?.is_none() {
                return Err(atelier_core::Error::ContactNotFound(contact_id).into());
            }
            let id = service.add_project_role(project_id, contact_id, role).await?;

            if out.emit(&serde_json::json!({ "id": id }))? {
                return Ok(());
            }
            out.note(format!("Assigned contact {} as {} (role id {}).", contact_id, role, id));
        }

        RoleAction::Remove { role_id } => {
            service.remove_project_role(role_id).await?;
            if out.emit(&serde_json::json!({ "id": role_id, "removed": true }))? {
                return Ok(());
            }
            out.note(format!("Role assignment {} removed.", role_id));
        }

        RoleAction::RemoveCustomer { project_id, slot } => {
            let slot = RoleSlot::customer(usize::from(slot - 1)).ok_or_else(|| {
                atelier_core::Error::InvalidInput(format!("Customer slot {} does not exist", slot))
            })?;
            let removed = service.remove_customer_slot(project_id, slot).await?;

            if out.emit(&serde_json::json!({ "slot": slot.label(), "removed": removed }))? {
                return Ok(());
            }
            if removed {
                out.note(format!("{} removed.", slot));
            } else {
                out.note(format!("{} is empty.", slot));
            }
        }
    }
    Ok(())
}

async fn cmd_stages(db: &Database, action: StageAction, out: Output) -> anyhow::Result<()> {
    let service = ProjectService::new(db);

    match action {
        StageAction::List => {
            let mut listing = Vec::new();
            for stage in service.list_stages().await? {
                let tasks = service.list_tasks_by_stage(stage.id).await?;
                listing.push((stage, tasks));
            }

            let as_json: Vec<_> = listing
                .iter()
                .map(|(stage, tasks)| {
                    serde_json::json!({ "id": stage.id, "name": stage.name, "tasks": tasks })
                })
                .collect();
            if out.emit(&as_json)? {
                return Ok(());
            }
            for (stage, tasks) in &listing {
                println!("{:>4}  {}", stage.id, stage.name);
                for task in tasks {
                    println!("        {:>3}  {}", task.id, task.description);
                }
            }
        }
    }
    Ok(())
}

async fn cmd_tasks(db: &Database, action: TaskAction, out: Output) -> anyhow::Result<()> {
    let service = ProjectService::new(db);

    match action {
        TaskAction::List {
            project_id,
            stage,
            all,
        } => {
            let project = service
                .get_project(project_id)
                .await?
                .ok_or(atelier_core::Error::ProjectNotFound(project_id))?;

            let stages = match (stage, all, project.stage_id) {
                (Some(name), _, _) => vec![
                    service
                        .find_stage_by_name(&name)
                        .await?
                        .ok_or_else(|| atelier_core::Error::StageNotFound(name.clone()))?,
                ],
                (None, false, Some(stage_id)) => {
                    service.get_stage(stage_id).await?.into_iter().collect()
                }
                _ => service.list_stages().await?,
            };

            let mut checklist = Vec::with_capacity(stages.len());
            for stage in stages {
                let tasks = service.task_views_for_stage(project_id, stage.id).await?;
                checklist.push((stage, tasks));
            }

            let as_json: Vec<_> = checklist
                .iter()
                .map(|(stage, tasks)| serde_json::json!({ "stage": stage.name, "tasks": tasks }))
                .collect();
            if out.emit(&as_json)? {
                return Ok(());
            }
            for (stage, tasks) in &checklist {
                print_checklist(&stage.name, tasks);
            }
            if !out.quiet {
                let done = checklist
                    .iter()
                    .flat_map(|(_, tasks)| tasks)
                    .filter(|t| t.is_done)
                    .count();
                let total: usize = checklist.iter().map(|(_, tasks)| tasks.len()).sum();
                println!();
                println!("{}/{} done", done, total);
            }
        }

        TaskAction::Done {
            project_id,
            task_ids,
        } => set_tasks(&service, project_id, &task_ids, true, out).await?,

        TaskAction::Undone {
            project_id,
            task_ids,
        } => set_tasks(&service, project_id, &task_ids, false, out).await?,
    }
    Ok(())
}

async fn set_tasks(
    service: &ProjectService<'_>,
    project_id: i64,
    task_ids: &[i64],
    done: bool,
    out: Output,
) -> anyhow::Result<()> {
    if service.get_project(project_id).await?.is_none() {
        return Err(atelier_core::Error::ProjectNotFound(project_id).into());
    }
    for &task_id in task_ids {
        if service.get_task(task_id).await?.is_none() {
            return Err(atelier_core::Error::TaskNotFound(task_id).into());
        }
    }

    for &task_id in task_ids {
        service.set_task_done(project_id, task_id, done).await?;
    }

    if out.emit(&serde_json::json!({ "project_id": project_id, "tasks": task_ids, "done": done }))? {
        return Ok(());
    }
    let state = if done { "done" } else { "not done" };
    out.note(format!("Marked {} task(s) {}.", task_ids.len(), state));
    Ok(())
}

fn cmd_config(action: ConfigAction, out: Output) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            out.note(format!("Set {} = {}", key, value));
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            if out.emit(&items)? {
                return Ok(());
            }
            for (key, value) in items {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            out.note("Configuration reset to defaults.");
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn cmd_doctor(db_path: Option<&Path>, out: Output) -> anyhow::Result<()> {
    let quiet = out.quiet;
    if !quiet {
        println!("Atelier Health Check");
        println!("====================");
        println!();
    }

    let mut all_ok = true;

    // Check configuration
    let config = match Config::load() {
        Ok(config) => {
            if !quiet {
                println!("[OK] Configuration: Valid");
            }
            config
        }
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Configuration: Error - {}", e);
            }
            Config::default()
        }
    };

    // Check config file location
    if !quiet {
        match Config::config_path() {
            Ok(path) if path.exists() => println!("[OK] Config file: {}", path.display()),
            Ok(path) => println!("[--] Config file: {} (using defaults)", path.display()),
            Err(e) => println!("[!!] Config file: Error - {}", e),
        }
    }

    // Check database
    match open_db(&config, db_path).await {
        Ok(db) => match db.health_check().await {
            Ok(()) => {
                if !quiet {
                    println!("[OK] Database: Connected");
                    println!("     Path: {}", db.path().display());
                }

                match db.migration_status().await {
                    Ok(status) if status.needs_migration => {
                        all_ok = false;
                        if !quiet {
                            println!(
                                "[!!] Database: Migrations pending (v{} -> v{})",
                                status.current_version, status.target_version
                            );
                        }
                    }
                    Ok(status) => {
                        if !quiet {
                            println!("[OK] Database: Schema v{}", status.current_version);
                        }
                    }
                    Err(e) => {
                        all_ok = false;
                        if !quiet {
                            println!("[!!] Database: Migration check failed - {}", e);
                        }
                    }
                }

                match db.reference_counts().await {
                    Ok((stages, tasks)) if stages > 0 && tasks > 0 => {
                        if !quiet {
                            println!("[OK] Reference data: {} stages, {} tasks", stages, tasks);
                        }
                    }
                    Ok(_) => {
                        all_ok = false;
                        if !quiet {
                            println!("[!!] Reference data: Missing stages or tasks");
                            println!("     Run `atelier init` to seed them");
                        }
                    }
                    Err(e) => {
                        all_ok = false;
                        if !quiet {
                            println!("[!!] Reference data: Error - {}", e);
                        }
                    }
                }

                if !quiet {
                    let projects = ProjectService::new(&db)
                        .list_projects("", false)
                        .await
                        .map(|p| p.len())
                        .unwrap_or_default();
                    println!("     Projects: {}", projects);
                }
            }
            Err(e) => {
                all_ok = false;
                if !quiet {
                    println!("[!!] Database: Health check failed - {}", e);
                }
            }
        },
        Err(e) => {
            all_ok = false;
            if !quiet {
                println!("[!!] Database: Failed to initialize - {:#}", e);
            }
        }
    }

    // Summary
    if !quiet {
        println!();
        if all_ok {
            println!("All checks passed!");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }

    Ok(())
}
