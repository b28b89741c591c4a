use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use time::OffsetDateTime;

use crate::config::ActivatorConfig;
use crate::error::ActivatorError;
use crate::link;
use crate::mailer::{NotifyData, TemplateKind};

/// Loads and renders email templates.
///
/// Templates live at `<templates>/<language>/<kind>.tpl.html`; a missing
/// language falls back to the `default` directory. Rendering substitutes
/// `{{var}}` placeholders; unknown placeholders render empty.
pub struct Composer {
    templates: PathBuf,
    base_url: String,
    path_activate: String,
    path_password_reset: String,
    path_cafe_auth: String,
    path_cafe_reset: String,
    cache: Option<Mutex<HashMap<String, String>>>,
}

impl Composer {
    pub fn new(config: &ActivatorConfig) -> Self {
        Self {
            templates: config.templates.clone(),
            base_url: config.base_url(),
            path_activate: config.path_activate.clone(),
            path_password_reset: config.path_password_reset.clone(),
            path_cafe_auth: config.path_cafe_auth.clone(),
            path_cafe_reset: config.path_cafe_reset.clone(),
            cache: config.cache_templates.then(|| Mutex::new(HashMap::new())),
        }
    }

    pub async fn compose(
        &self,
        kind: TemplateKind,
        lang: &str,
        data: &NotifyData,
    ) -> Result<String, ActivatorError> {
        let source = self.load(kind, lang).await?;
        let querystring = link::build_path(data.id.as_deref(), &data.code, Some(&data.email));

        let mut vars: HashMap<&str, String> = HashMap::new();
        vars.insert("base_url", self.base_url.clone());
        vars.insert("activation_link", self.path_activate.clone());
        vars.insert("passwordreset_link", self.path_password_reset.clone());
        vars.insert("cafeauth_link", self.path_cafe_auth.clone());
        vars.insert("cafereset_link", self.path_cafe_reset.clone());
        vars.insert("link_querystring", querystring);
        vars.insert("cur_year", OffsetDateTime::now_utc().year().to_string());
        vars.insert("code", data.code.clone());
        vars.insert("email", data.email.clone());
        vars.insert("id", data.id.clone().unwrap_or_default());

        Ok(render(&source, &vars))
    }

    async fn load(&self, kind: TemplateKind, lang: &str) -> Result<String, ActivatorError> {
        let key = format!("{}/{}", lang, kind.file_stem());
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache
                .lock()
                .expect("template cache lock poisoned")
                .get(&key)
            {
                return Ok(hit.clone());
            }
        }

        let source = self.read(kind, lang).await?;

        if let Some(cache) = &self.cache {
            cache
                .lock()
                .expect("template cache lock poisoned")
                .insert(key, source.clone());
        }
        Ok(source)
    }

    async fn read(&self, kind: TemplateKind, lang: &str) -> Result<String, ActivatorError> {
        match self.read_file(kind, lang).await {
            Ok(source) => Ok(source),
            // fall back to the default language once
            Err(_) if lang != "default" => {
                self.read_file(kind, "default").await.map_err(|err| {
                    tracing::error!(
                        kind = kind.file_stem(),
                        error = %err,
                        "template not found"
                    );
                    ActivatorError::common(500, "Template Not Found")
                })
            }
            Err(err) => {
                tracing::error!(kind = kind.file_stem(), error = %err, "template not found");
                Err(ActivatorError::common(500, "Template Not Found"))
            }
        }
    }

    async fn read_file(&self, kind: TemplateKind, lang: &str) -> std::io::Result<String> {
        let path = self
            .templates
            .join(lang)
            .join(format!("{}.tpl.html", kind.file_stem()));
        tokio::fs::read_to_string(path).await
    }
}

fn render(source: &str, vars: &HashMap<&str, String>) -> String {
    lazy_static! {
        static ref PLACEHOLDER_RE: Regex =
            Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap();
    }
    PLACEHOLDER_RE
        .replace_all(source, |caps: &Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod compose_tests {
    use super::*;
    use std::fs;

    fn data() -> NotifyData {
        NotifyData {
            code: "code-1".into(),
            email: "you@hotmail.com".into(),
            id: Some("2".into()),
            request: None,
        }
    }

    fn write_templates(root: &std::path::Path) {
        fs::create_dir_all(root.join("default")).expect("mkdir default");
        fs::write(
            root.join("default/activate.tpl.html"),
            "<a href=\"{{base_url}}{{activation_link}}{{link_querystring}}\">go</a> {{cur_year}}",
        )
        .expect("write activate template");
        fs::create_dir_all(root.join("de_DE")).expect("mkdir de_DE");
        fs::write(
            root.join("de_DE/passwordreset.tpl.html"),
            "Hallo {{email}}: {{passwordreset_link}}{{link_querystring}}",
        )
        .expect("write reset template");
    }

    fn composer(root: &std::path::Path, cache: bool) -> Composer {
        let config = ActivatorConfig {
            templates: root.to_path_buf(),
            cache_templates: cache,
            ..ActivatorConfig::default()
        };
        Composer::new(&config)
    }

    fn temp_root(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("accountflow-compose-{tag}-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn renders_links_and_variables() {
        let root = temp_root("render");
        write_templates(&root);

        let html = composer(&root, false)
            .compose(TemplateKind::Activate, "en_US", &data())
            .await
            .expect("compose ok");

        assert!(html.contains("https://localhost/api/1/users/activate/2/code-1/"));
        assert!(html.contains(&OffsetDateTime::now_utc().year().to_string()));
    }

    #[tokio::test]
    async fn falls_back_to_default_language() {
        let root = temp_root("fallback");
        write_templates(&root);
        let composer = composer(&root, false);

        // de_DE has no activate template, default does
        let html = composer
            .compose(TemplateKind::Activate, "de_DE", &data())
            .await
            .expect("fallback ok");
        assert!(html.contains("/api/1/users/activate/"));

        // de_DE reset template is picked when present
        let html = composer
            .compose(TemplateKind::PasswordReset, "de_DE", &data())
            .await
            .expect("native ok");
        assert!(html.starts_with("Hallo you@hotmail.com"));
    }

    #[tokio::test]
    async fn missing_template_is_a_common_error() {
        let root = temp_root("missing");
        fs::create_dir_all(&root).expect("mkdir root");

        let err = composer(&root, false)
            .compose(TemplateKind::CafeAuth, "en_US", &data())
            .await
            .unwrap_err();
        assert_eq!(err, ActivatorError::common(500, "Template Not Found"));
    }

    #[tokio::test]
    async fn cache_serves_template_after_file_removal() {
        let root = temp_root("cache");
        write_templates(&root);
        let composer = composer(&root, true);

        composer
            .compose(TemplateKind::Activate, "en_US", &data())
            .await
            .expect("first compose ok");
        fs::remove_file(root.join("default/activate.tpl.html")).expect("remove template");
        composer
            .compose(TemplateKind::Activate, "en_US", &data())
            .await
            .expect("cached compose ok");
    }

    #[test]
    fn unknown_placeholders_render_empty() {
        let vars = HashMap::from([("code", "abc".to_string())]);
        assert_eq!(render("x {{code}} y {{nope}} z", &vars), "x abc y  z");
    }
}
