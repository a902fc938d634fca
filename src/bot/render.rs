//! Reply rendering. Templates produce Telegram MarkdownV2; dynamic values go
//! through the `md` (prose) or `code` (inside backticks) escaping filters.

use minijinja::{Environment, Value, context};

use crate::chat::{Incoming, escape_code, escape_markdown};
use crate::domain::{BatchOutcome, Service};

const TEMPLATES: &[(&str, &str)] = &[
    ("help", include_str!("../templates/help.md.jinja")),
    ("services", include_str!("../templates/services.md.jinja")),
    ("stands", include_str!("../templates/stands.md.jinja")),
    ("tags", include_str!("../templates/tags.md.jinja")),
    ("echo", include_str!("../templates/echo.md.jinja")),
];

fn md(value: Value) -> String {
    escape_markdown(&value.to_string())
}

fn code(value: Value) -> String {
    escape_code(&value.to_string())
}

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_filter("md", md);
        env.add_filter("code", code);
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: Value) -> Result<String, minijinja::Error> {
        let text = self.env.get_template(name)?.render(ctx)?;
        Ok(text.trim_end().to_string())
    }

    pub fn help(&self, default_branch: &str) -> Result<String, minijinja::Error> {
        self.render("help", context! { default_branch })
    }

    pub fn services(
        &self,
        stand: Option<&str>,
        services: &[Service],
    ) -> Result<String, minijinja::Error> {
        self.render("services", context! { stand, services })
    }

    pub fn stands(&self, stands: &[String]) -> Result<String, minijinja::Error> {
        self.render("stands", context! { stands })
    }

    pub fn tags(&self, title: &str, outcome: &BatchOutcome) -> Result<String, minijinja::Error> {
        self.render("tags", context! { title, outcome })
    }

    pub fn echo(&self, message: &Incoming) -> Result<String, minijinja::Error> {
        self.render(
            "echo",
            context! {
                user => &message.sender_name,
                user_id => &message.sender_id,
                chat_id => &message.chat_id,
            },
        )
    }
}
