//! The installation orchestrator.
//!
//! One run: guard, discover the schema, apply it atomically together with
//! the info row and the migration ledger, then seed content best-effort.
//! Failures before or at commit are always fatal and roll back every schema
//! change. After commit, only administrator creation is fatal; every other
//! seeding step degrades to a warning on the report, and later steps still
//! run after an earlier one fails.

use std::{fmt, sync::Arc};

use atrium_core::{
  content::{
    EntryType, Field, FieldGroup, NewEntry, NewUser, Section, SectionKind,
    SectionLocale, Session, TagGroup, User,
  },
  error::InstallError,
  gateway::{AccountService, ContentService, SchemaGateway, SettingsService},
  info::InfoRecord,
  request::{BuildMetadata, InstallRequest},
  schema::SchemaPlan,
  state::{InstallPhase, InstalledFlag},
};
use chrono::Utc;
use tracing::{info, warn};

use crate::{catalog::Registry, manifest::MigrationManifest, tables};

// ─── Report ──────────────────────────────────────────────────────────────────

/// An advisory failure: logged, recorded, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallWarning {
  pub step:    &'static str,
  pub message: String,
}

/// The outcome of a successful run.
#[derive(Debug, Clone)]
pub struct InstallReport {
  /// Every phase the run reached, in order, ending with
  /// [`InstallPhase::Installed`]. Phases whose step failed advisorily are
  /// absent.
  pub trail:    Vec<InstallPhase>,
  pub admin:    User,
  pub session:  Option<Session>,
  pub warnings: Vec<InstallWarning>,
}

impl InstallReport {
  pub fn phase(&self) -> InstallPhase {
    self.trail.last().copied().unwrap_or(InstallPhase::NotInstalled)
  }
}

// ─── Installer ───────────────────────────────────────────────────────────────

/// The installation orchestrator. Every collaborator is injected, so each is
/// independently substitutable.
pub struct Installer<G, A, C, S> {
  gateway:  Arc<G>,
  accounts: Arc<A>,
  content:  Arc<C>,
  settings: Arc<S>,
  registry: Registry,
  manifest: MigrationManifest,
  build:    BuildMetadata,
  flag:     InstalledFlag,
}

impl<G, A, C, S> Installer<G, A, C, S>
where
  G: SchemaGateway,
  A: AccountService,
  C: ContentService,
  S: SettingsService,
{
  pub fn new(
    gateway: Arc<G>,
    accounts: Arc<A>,
    content: Arc<C>,
    settings: Arc<S>,
    registry: Registry,
    manifest: MigrationManifest,
    build: BuildMetadata,
  ) -> Self {
    Self {
      gateway,
      accounts,
      content,
      settings,
      registry,
      manifest,
      build,
      flag: InstalledFlag::new(),
    }
  }

  /// The process-wide installed marker, flipped when a run completes.
  pub fn installed_flag(&self) -> InstalledFlag { self.flag.clone() }

  /// Install the platform into a fresh target store.
  pub async fn run(
    &self,
    request: &InstallRequest,
  ) -> Result<InstallReport, InstallError> {
    if self.flag.is_set() || self.gateway.is_installed().await? {
      return Err(InstallError::AlreadyInstalled);
    }

    info!(site = %request.site_name, "installing atrium");

    let mut definitions = self.registry.discover();
    definitions.extend(tables::system_tables());
    let plan = SchemaPlan::new(definitions)?;

    let info_record = InfoRecord::new(request, &self.build);
    info_record.validate()?;
    let ledger = self.manifest.ledger(Utc::now())?;

    info!(tables = plan.len(), ledger_rows = ledger.len(), "applying schema");
    self.gateway.apply_schema(&plan, &info_record, &ledger).await?;

    let mut trail = vec![InstallPhase::SchemaCommitted];
    info!("schema committed");

    let mut warnings = Vec::new();

    // Primary locale. Advisory.
    info!(locale = %request.locale, "adding the primary locale");
    match self.gateway.add_locale(&request.locale, 1).await {
      Ok(()) => trail.push(InstallPhase::LocaleSet),
      Err(err) => advise(&mut warnings, "locale", err),
    }

    // Administrator account. The one fatal post-commit step: the schema
    // stays installed, but the run as a whole fails.
    info!(username = %request.username, "creating the administrator");
    let admin = self
      .accounts
      .save_user(&NewUser {
        username: request.username.clone(),
        email:    request.email.clone(),
        password: request.password.clone(),
        admin:    true,
      })
      .await
      .map_err(InstallError::from)?;
    trail.push(InstallPhase::AdminCreated);

    // Session, only when a person is driving the install.
    let session = if request.interactive {
      info!("logging the administrator in");
      match self.accounts.login(&request.username, &request.password).await {
        Ok(session) => {
          trail.push(InstallPhase::SessionEstablished);
          Some(session)
        }
        Err(err) => {
          advise(&mut warnings, "session", err);
          None
        }
      }
    } else {
      trail.push(InstallPhase::SessionSkipped);
      None
    };

    // Default mail settings. Advisory.
    info!("saving default mail settings");
    let mail = serde_json::json!({
      "protocol":      "local",
      "email_address": request.email,
      "sender_name":   request.site_name,
    });
    match self.settings.save_settings("email", &mail).await {
      Ok(()) => trail.push(InstallPhase::MailSeeded),
      Err(err) => advise(&mut warnings, "mail settings", err),
    }

    // Default content. Every step advisory; later steps still run after an
    // earlier failure.
    self.seed_default_content(request, &admin, &mut warnings).await;
    trail.push(InstallPhase::ContentSeeded);

    self.flag.set();
    trail.push(InstallPhase::Installed);
    info!("finished installing atrium");

    Ok(InstallReport { trail, admin, session, warnings })
  }

  async fn seed_default_content(
    &self,
    request: &InstallRequest,
    admin: &User,
    warnings: &mut Vec<InstallWarning>,
  ) {
    // Default tag group.
    info!("creating the default tag group");
    let tag_group_id = match self
      .content
      .save_tag_group(&TagGroup {
        name:   "Default".to_string(),
        handle: "default".to_string(),
      })
      .await
    {
      Ok(id) => Some(id),
      Err(err) => {
        advise(warnings, "tag group", err);
        None
      }
    };

    // Default field group.
    info!("creating the default field group");
    let field_group_id = match self
      .content
      .save_field_group(&FieldGroup { name: "Default".to_string() })
      .await
    {
      Ok(id) => Some(id),
      Err(err) => {
        advise(warnings, "field group", err);
        None
      }
    };

    // Body field.
    info!("creating the body field");
    let body_field_id = match self
      .content
      .save_field(&Field {
        group_id:     field_group_id,
        name:         "Body".to_string(),
        handle:       "body".to_string(),
        field_type:   "richtext".to_string(),
        translatable: true,
        settings:     serde_json::json!({
          "config_file": "standard.json",
          "column_type": "text",
        }),
      })
      .await
    {
      Ok(id) => Some(id),
      Err(err) => {
        advise(warnings, "body field", err);
        None
      }
    };

    // Tags field.
    info!("creating the tags field");
    let tags_settings = match tag_group_id {
      Some(id) => serde_json::json!({ "source": format!("taggroup:{id}") }),
      None => serde_json::json!({}),
    };
    let tags_field_id = match self
      .content
      .save_field(&Field {
        group_id:     field_group_id,
        name:         "Tags".to_string(),
        handle:       "tags".to_string(),
        field_type:   "tags".to_string(),
        translatable: false,
        settings:     tags_settings,
      })
      .await
    {
      Ok(id) => Some(id),
      Err(err) => {
        advise(warnings, "tags field", err);
        None
      }
    };

    // Homepage single section with its welcome entry.
    info!("creating the homepage section");
    let homepage = Section {
      name:     "Homepage".to_string(),
      handle:   "homepage".to_string(),
      kind:     SectionKind::Single,
      has_urls: false,
      template: Some("index".to_string()),
      locales:  vec![SectionLocale {
        locale:     request.locale.clone(),
        url_format: Some("__home__".to_string()),
      }],
    };
    match self.content.save_section(&homepage).await {
      Ok(saved) => {
        let entry_type = EntryType {
          id:              saved.entry_type_id,
          section_id:      saved.id,
          name:            "Homepage".to_string(),
          has_title_field: true,
          title_label:     "Title".to_string(),
          field_layout:    body_field_id.into_iter().collect(),
        };
        if let Err(err) = self.content.save_entry_type(&entry_type).await {
          advise(warnings, "homepage entry type", err);
        }

        match saved.entry_id {
          Some(entry_id) => {
            let entry = NewEntry {
              id:         Some(entry_id),
              section_id: saved.id,
              type_id:    saved.entry_type_id,
              author_id:  None,
              locale:     request.locale.clone(),
              title:      format!("Welcome to {}!", request.site_name),
              content:    vec![(
                "body".to_string(),
                welcome_body(&request.site_name),
              )],
              enabled:    true,
            };
            if let Err(err) = self.content.save_entry(&entry).await {
              advise(warnings, "homepage entry", err);
            }
          }
          None => advise(
            warnings,
            "homepage entry",
            "single section produced no entry",
          ),
        }
      }
      Err(err) => advise(warnings, "homepage section", err),
    }

    // News channel section with one example entry by the administrator.
    info!("creating the news section");
    let news = Section {
      name:     "News".to_string(),
      handle:   "news".to_string(),
      kind:     SectionKind::Channel,
      has_urls: true,
      template: Some("news/_entry".to_string()),
      locales:  vec![SectionLocale {
        locale:     request.locale.clone(),
        url_format: Some("news/{postDate.year}/{slug}".to_string()),
      }],
    };
    match self.content.save_section(&news).await {
      Ok(saved) => {
        let mut layout: Vec<i64> = body_field_id.into_iter().collect();
        layout.extend(tags_field_id);
        let entry_type = EntryType {
          id:              saved.entry_type_id,
          section_id:      saved.id,
          name:            "News".to_string(),
          has_title_field: true,
          title_label:     "Title".to_string(),
          field_layout:    layout,
        };
        if let Err(err) = self.content.save_entry_type(&entry_type).await {
          advise(warnings, "news entry type", err);
        }

        let entry = NewEntry {
          id:         None,
          section_id: saved.id,
          type_id:    saved.entry_type_id,
          author_id:  Some(admin.id),
          locale:     request.locale.clone(),
          title:      "We just installed Atrium!".to_string(),
          content:    vec![(
            "body".to_string(),
            news_body(&request.site_name),
          )],
          enabled:    true,
        };
        if let Err(err) = self.content.save_entry(&entry).await {
          advise(warnings, "news entry", err);
        }
      }
      Err(err) => advise(warnings, "news section", err),
    }
  }
}

fn advise(
  warnings: &mut Vec<InstallWarning>,
  step: &'static str,
  error: impl fmt::Display,
) {
  warn!(step, error = %error, "continuing without this step");
  warnings.push(InstallWarning { step, message: error.to_string() });
}

fn welcome_body(site_name: &str) -> String {
  format!(
    "<p>This site is brand new. The developers have just finished \
     installing the CMS and the editors are getting set up, so check back \
     soon: before long {site_name} will be full of fresh writing.</p>"
  )
}

fn news_body(site_name: &str) -> String {
  format!(
    "<p>Atrium is the CMS now powering {site_name}. We are looking forward \
     to seeing what it can do.</p><!--pagebreak--><p>This paragraph was \
     entered after a page break, so the news index template only shows the \
     part above it.</p>"
  )
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  };

  use atrium_core::{
    content::SavedSection,
    error::{SaveError, SchemaError, ValidationError},
    migration::MigrationRecord,
  };

  use super::*;

  // ── Mocks ──────────────────────────────────────────────────────────────────

  #[derive(Default)]
  struct MockGateway {
    installed:   AtomicBool,
    fail_apply:  bool,
    fail_locale: bool,
    applied:     Mutex<Option<(usize, Vec<String>)>>,
    locales:     Mutex<Vec<String>>,
  }

  impl SchemaGateway for MockGateway {
    async fn is_installed(&self) -> Result<bool, SchemaError> {
      Ok(self.installed.load(Ordering::SeqCst))
    }

    async fn apply_schema(
      &self,
      plan: &SchemaPlan,
      _info: &InfoRecord,
      ledger: &[MigrationRecord],
    ) -> Result<(), InstallError> {
      if self.fail_apply {
        return Err(
          SchemaError::Ddl {
            table:   "content".to_string(),
            message: "table already exists".to_string(),
          }
          .into(),
        );
      }
      let versions = ledger.iter().map(|m| m.version.clone()).collect();
      *self.applied.lock().unwrap() = Some((plan.len(), versions));
      self.installed.store(true, Ordering::SeqCst);
      Ok(())
    }

    async fn add_locale(
      &self,
      locale: &str,
      _sort_order: i64,
    ) -> Result<(), SaveError> {
      if self.fail_locale {
        return Err(SaveError::Storage("locale store offline".to_string()));
      }
      self.locales.lock().unwrap().push(locale.to_string());
      Ok(())
    }
  }

  #[derive(Default)]
  struct MockAccounts {
    reject_user: bool,
    reject_login: bool,
    users:       Mutex<Vec<NewUser>>,
  }

  impl AccountService for MockAccounts {
    async fn save_user(&self, user: &NewUser) -> Result<User, SaveError> {
      if self.reject_user {
        return Err(
          ValidationError::single("user", "username", "cannot be blank")
            .into(),
        );
      }
      self.users.lock().unwrap().push(user.clone());
      Ok(User {
        id:       1,
        username: user.username.clone(),
        email:    user.email.clone(),
        admin:    user.admin,
      })
    }

    async fn login(
      &self,
      _username: &str,
      _password: &str,
    ) -> Result<Session, SaveError> {
      if self.reject_login {
        return Err(SaveError::Storage("invalid credentials".to_string()));
      }
      Ok(Session { id: 1, user_id: 1, token: "token".to_string() })
    }
  }

  #[derive(Default)]
  struct MockContent {
    fail_fields: bool,
    calls:       Mutex<Vec<&'static str>>,
  }

  impl MockContent {
    fn record(&self, call: &'static str) {
      self.calls.lock().unwrap().push(call);
    }
  }

  impl ContentService for MockContent {
    async fn save_tag_group(&self, _: &TagGroup) -> Result<i64, SaveError> {
      self.record("tag_group");
      Ok(1)
    }

    async fn save_field_group(
      &self,
      _: &FieldGroup,
    ) -> Result<i64, SaveError> {
      self.record("field_group");
      Ok(2)
    }

    async fn save_field(&self, _: &Field) -> Result<i64, SaveError> {
      self.record("field");
      if self.fail_fields {
        return Err(SaveError::Storage("field store offline".to_string()));
      }
      Ok(10)
    }

    async fn save_section(
      &self,
      section: &Section,
    ) -> Result<SavedSection, SaveError> {
      self.record("section");
      Ok(SavedSection {
        id:            5,
        entry_type_id: 6,
        entry_id:      matches!(section.kind, SectionKind::Single)
          .then_some(7),
      })
    }

    async fn save_entry_type(&self, _: &EntryType) -> Result<(), SaveError> {
      self.record("entry_type");
      Ok(())
    }

    async fn save_entry(&self, _: &NewEntry) -> Result<i64, SaveError> {
      self.record("entry");
      Ok(7)
    }
  }

  #[derive(Default)]
  struct MockSettings {
    fail:  bool,
    saved: Mutex<Vec<(String, serde_json::Value)>>,
  }

  impl SettingsService for MockSettings {
    async fn save_settings(
      &self,
      category: &str,
      settings: &serde_json::Value,
    ) -> Result<(), SaveError> {
      if self.fail {
        return Err(SaveError::Storage("settings store offline".to_string()));
      }
      self
        .saved
        .lock()
        .unwrap()
        .push((category.to_string(), settings.clone()));
      Ok(())
    }
  }

  // ── Fixtures ───────────────────────────────────────────────────────────────

  type MockInstaller =
    Installer<MockGateway, MockAccounts, MockContent, MockSettings>;

  fn installer(
    gateway: MockGateway,
    accounts: MockAccounts,
    content: MockContent,
    settings: MockSettings,
  ) -> MockInstaller {
    Installer::new(
      Arc::new(gateway),
      Arc::new(accounts),
      Arc::new(content),
      Arc::new(settings),
      Registry::platform(),
      MigrationManifest::from_names([
        "m131205_000001_rename_handles",
        "m140204_000002_add_tags",
      ])
      .unwrap(),
      BuildMetadata::for_tests(),
    )
  }

  fn default_installer() -> MockInstaller {
    installer(
      MockGateway::default(),
      MockAccounts::default(),
      MockContent::default(),
      MockSettings::default(),
    )
  }

  fn request() -> InstallRequest {
    InstallRequest {
      locale:      "en_us".to_string(),
      site_name:   "Example Site".to_string(),
      site_url:    "https://example.com".to_string(),
      email:       "admin@example.com".to_string(),
      username:    "admin".to_string(),
      password:    "correct-horse".to_string(),
      track:       "stable".to_string(),
      interactive: false,
    }
  }

  // ── Happy path ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn successful_run_reaches_installed() {
    let ins = default_installer();
    let report = ins.run(&request()).await.unwrap();

    assert_eq!(report.phase(), InstallPhase::Installed);
    assert!(report.trail.contains(&InstallPhase::SessionSkipped));
    assert!(report.warnings.is_empty());
    assert!(ins.installed_flag().is_set());
    assert_eq!(report.admin.username, "admin");
    assert!(report.admin.admin);
    assert!(report.session.is_none());

    let applied = ins.gateway.applied.lock().unwrap().clone().unwrap();
    // 14 record tables + 11 fixed system tables.
    assert_eq!(applied.0, 25);
    // Baseline plus the two manifest versions, baseline first.
    assert_eq!(applied.1, [
      "m000000_000000_base",
      "m131205_000001_rename_handles",
      "m140204_000002_add_tags",
    ]);

    assert_eq!(*ins.gateway.locales.lock().unwrap(), ["en_us"]);
    let calls = ins.content.calls.lock().unwrap().clone();
    assert_eq!(calls, [
      "tag_group",
      "field_group",
      "field",
      "field",
      "section",
      "entry_type",
      "entry",
      "section",
      "entry_type",
      "entry",
    ]);

    let saved = ins.settings.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "email");
    assert_eq!(saved[0].1["protocol"], "local");
  }

  // ── Guard ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn second_run_is_rejected() {
    let ins = default_installer();
    ins.run(&request()).await.unwrap();

    let err = ins.run(&request()).await.unwrap_err();
    assert!(matches!(err, InstallError::AlreadyInstalled));
  }

  #[tokio::test]
  async fn installed_store_is_rejected_before_any_work() {
    let gateway = MockGateway::default();
    gateway.installed.store(true, Ordering::SeqCst);
    let ins = installer(
      gateway,
      MockAccounts::default(),
      MockContent::default(),
      MockSettings::default(),
    );

    let err = ins.run(&request()).await.unwrap_err();
    assert!(matches!(err, InstallError::AlreadyInstalled));
    assert!(ins.gateway.applied.lock().unwrap().is_none());
  }

  // ── Fatal paths ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn schema_failure_aborts_before_any_seeding() {
    let ins = installer(
      MockGateway { fail_apply: true, ..Default::default() },
      MockAccounts::default(),
      MockContent::default(),
      MockSettings::default(),
    );

    let err = ins.run(&request()).await.unwrap_err();
    assert!(matches!(err, InstallError::Schema(SchemaError::Ddl { .. })));
    assert!(ins.accounts.users.lock().unwrap().is_empty());
    assert!(ins.content.calls.lock().unwrap().is_empty());
    assert!(!ins.installed_flag().is_set());
  }

  #[tokio::test]
  async fn admin_failure_is_fatal_but_schema_stays() {
    let ins = installer(
      MockGateway::default(),
      MockAccounts { reject_user: true, ..Default::default() },
      MockContent::default(),
      MockSettings::default(),
    );

    let err = ins.run(&request()).await.unwrap_err();
    match err {
      InstallError::Validation(v) => {
        assert_eq!(v.record, "user");
        assert_eq!(v.errors[0].field, "username");
      }
      other => panic!("expected validation error, got {other:?}"),
    }

    // Schema was applied and stays; nothing after the admin step ran.
    assert!(ins.gateway.applied.lock().unwrap().is_some());
    assert!(ins.content.calls.lock().unwrap().is_empty());
    assert!(ins.settings.saved.lock().unwrap().is_empty());
    assert!(!ins.installed_flag().is_set());
  }

  #[tokio::test]
  async fn invalid_info_record_is_rejected_before_schema() {
    let ins = default_installer();
    let mut req = request();
    req.site_name = String::new();

    let err = ins.run(&req).await.unwrap_err();
    match err {
      InstallError::Validation(v) => assert_eq!(v.record, "info"),
      other => panic!("expected validation error, got {other:?}"),
    }
    assert!(ins.gateway.applied.lock().unwrap().is_none());
  }

  // ── Advisory paths ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn locale_failure_is_advisory() {
    let ins = installer(
      MockGateway { fail_locale: true, ..Default::default() },
      MockAccounts::default(),
      MockContent::default(),
      MockSettings::default(),
    );

    let report = ins.run(&request()).await.unwrap();
    assert_eq!(report.phase(), InstallPhase::Installed);
    assert!(!report.trail.contains(&InstallPhase::LocaleSet));
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].step, "locale");
    assert_eq!(ins.accounts.users.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn mail_failure_is_advisory_and_content_still_seeds() {
    let ins = installer(
      MockGateway::default(),
      MockAccounts::default(),
      MockContent::default(),
      MockSettings { fail: true, ..Default::default() },
    );

    let report = ins.run(&request()).await.unwrap();
    assert_eq!(report.phase(), InstallPhase::Installed);
    assert!(!report.trail.contains(&InstallPhase::MailSeeded));
    assert!(report.warnings.iter().any(|w| w.step == "mail settings"));
    assert!(!ins.content.calls.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn field_failures_still_create_both_sections() {
    let ins = installer(
      MockGateway::default(),
      MockAccounts::default(),
      MockContent { fail_fields: true, ..Default::default() },
      MockSettings::default(),
    );

    let report = ins.run(&request()).await.unwrap();
    assert_eq!(report.phase(), InstallPhase::Installed);

    let field_warnings = report
      .warnings
      .iter()
      .filter(|w| w.step.ends_with("field"))
      .count();
    assert_eq!(field_warnings, 2);

    let calls = ins.content.calls.lock().unwrap().clone();
    assert_eq!(calls.iter().filter(|c| **c == "section").count(), 2);
    assert_eq!(calls.iter().filter(|c| **c == "entry").count(), 2);
  }

  // ── Session step ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn interactive_run_establishes_a_session() {
    let ins = default_installer();
    let mut req = request();
    req.interactive = true;

    let report = ins.run(&req).await.unwrap();
    assert!(report.trail.contains(&InstallPhase::SessionEstablished));
    assert!(report.session.is_some());
  }

  #[tokio::test]
  async fn interactive_login_failure_is_advisory() {
    let ins = installer(
      MockGateway::default(),
      MockAccounts { reject_login: true, ..Default::default() },
      MockContent::default(),
      MockSettings::default(),
    );
    let mut req = request();
    req.interactive = true;

    let report = ins.run(&req).await.unwrap();
    assert_eq!(report.phase(), InstallPhase::Installed);
    assert!(report.session.is_none());
    assert!(report.warnings.iter().any(|w| w.step == "session"));
  }
}
