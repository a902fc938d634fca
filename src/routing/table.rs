use crate::bot::Command;
use crate::config::BotConfig;

use super::{Matcher, Node, Router};

const ECHO: &str = r"[Ee]cho";
const HELP: &str = r"[Hh]elp|[Пп]омощь";
const STAND_SERVICES: &str = r"(?:[Ss]how services|[Пп]окажи сервисы)\s*\{[^{}]*\}";
const SERVICES: &str = r"[Ss]how services|[Пп]окажи сервисы";
const STANDS: &str = r"[Ss]how environments|[Ss]how stands|[Пп]окажи стенды";
const BUILD_TAGS: &str = concat!(
    r"(?:[Bb]uild services|[Bb]uild tags?|[Сс]обери сервисы|[Сс]обери теги?)",
    r"\s*\{[^{}]*\}\s+(?:prefix|префикс)\s*\{[^{}]*\}",
    r"(?:\s+(?:branch|ветка)\s*\{[^{}]*\})?",
);
const CURRENT_TAGS: &str = concat!(
    r"(?:[Ss]how tags?|[Пп]окажи теги?)",
    r"\s*\{[^{}]*\}\s+(?:prefix|префикс)\s*\{[^{}]*\}",
    r"(?:\s+(?:branch|ветка)\s*\{[^{}]*\})?",
);

/// The bot's command table. Patterns are matched against the whole message.
///
/// `echo` answers anyone so new operators can find their ids. Everything
/// else requires an allowed chat (any chat when none are configured), and
/// all but `help` additionally require an admin sender.
pub fn default_router(config: &BotConfig) -> Result<Router<Command>, regex::Error> {
    let chat_gate = if config.chats.is_empty() {
        Matcher::Any
    } else {
        Matcher::chats(config.chats.iter().cloned())
    };
    let admin_gate = Matcher::admins(config.admins.iter().cloned());

    Ok(Router::new(vec![
        Node::Leaf(Matcher::text(ECHO)?, Command::Echo),
        Node::Fork(
            chat_gate,
            vec![
                Node::Leaf(Matcher::text(HELP)?, Command::Help),
                Node::Fork(
                    admin_gate,
                    vec![
                        Node::Leaf(Matcher::text(STAND_SERVICES)?, Command::ListStandServices),
                        Node::Leaf(Matcher::text(SERVICES)?, Command::ListServices),
                        Node::Leaf(Matcher::text(STANDS)?, Command::ListStands),
                        Node::Leaf(Matcher::text(BUILD_TAGS)?, Command::BuildTags),
                        Node::Leaf(Matcher::text(CURRENT_TAGS)?, Command::ListCurrentTags),
                    ],
                ),
            ],
        ),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Incoming;

    fn config(chats: &[&str]) -> BotConfig {
        BotConfig {
            name: "bot".into(),
            token: "t".into(),
            admins: vec!["42".into()],
            chats: chats.iter().map(|c| (*c).to_string()).collect(),
            api_base: "https://api.telegram.org".into(),
            poll_timeout: 30,
        }
    }

    fn msg(sender: &str, chat: &str, text: &str) -> Incoming {
        Incoming {
            sender_id: sender.into(),
            sender_name: "someone".into(),
            chat_id: chat.into(),
            message_id: "1".into(),
            text: text.into(),
        }
    }

    fn route(router: &Router<Command>, text: &str) -> Option<Command> {
        router.route(&msg("42", "-1", text)).copied()
    }

    #[test]
    fn admin_commands() {
        let router = default_router(&config(&["-1"])).unwrap();
        let cases = [
            ("show services", Command::ListServices),
            ("Show services {stage}", Command::ListStandServices),
            ("show services{stage}", Command::ListStandServices),
            ("show environments", Command::ListStands),
            ("Покажи стенды", Command::ListStands),
            ("покажи сервисы {prod}", Command::ListStandServices),
            ("build services {a,b} prefix {v4.3.*}", Command::BuildTags),
            ("Build services {a} prefix {1.*} branch {main}", Command::BuildTags),
            ("Собери тег {a} префикс {1.*} ветка {main}", Command::BuildTags),
            ("show tags {a,b} prefix {v4.3.*}", Command::ListCurrentTags),
            ("Покажи тег {a} префикс {v4.*}", Command::ListCurrentTags),
            ("help", Command::Help),
            ("echo", Command::Echo),
        ];
        for (text, expected) in cases {
            assert_eq!(route(&router, text), Some(expected), "{text}");
        }
    }

    #[test]
    fn malformed_commands_are_ignored() {
        let router = default_router(&config(&[])).unwrap();
        for text in [
            "show services please",
            "build services {a}",
            "build services {a} prefix {1.*} branch",
            "show tags prefix {1.*}",
            "deploy everything",
        ] {
            assert_eq!(route(&router, text), None, "{text}");
        }
    }

    #[test]
    fn non_admin_only_gets_help_and_echo() {
        let router = default_router(&config(&["-1"])).unwrap();
        let outsider = |text: &str| router.route(&msg("7", "-1", text)).copied();
        assert_eq!(outsider("show services"), None);
        assert_eq!(outsider("build services {a} prefix {1.*}"), None);
        assert_eq!(outsider("help"), Some(Command::Help));
        assert_eq!(outsider("echo"), Some(Command::Echo));
    }

    #[test]
    fn foreign_chat_only_gets_echo() {
        let router = default_router(&config(&["-1"])).unwrap();
        let elsewhere = |text: &str| router.route(&msg("42", "-2", text)).copied();
        assert_eq!(elsewhere("show services"), None);
        assert_eq!(elsewhere("help"), None);
        assert_eq!(elsewhere("echo"), Some(Command::Echo));
    }

    #[test]
    fn empty_chat_list_allows_any_chat() {
        let router = default_router(&config(&[])).unwrap();
        assert_eq!(
            router.route(&msg("42", "-999", "show services")).copied(),
            Some(Command::ListServices)
        );
    }
}
