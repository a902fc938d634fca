//! Predicate-tree routing of chat messages to commands.
//!
//! A tree is an ordered list of nodes. Evaluation is depth-first and the
//! first leaf whose matcher chain holds wins; list order is the precedence.
//! Text matchers must cover the whole message, so a shorter pattern never
//! claims a longer command.
//! A fork whose matcher holds but whose children all miss falls through to
//! its next sibling. No match at all means the message is ignored.

mod matcher;
mod table;

pub use matcher::Matcher;
pub use table::default_router;

use crate::chat::Incoming;

#[derive(Debug, Clone)]
pub enum Node<C> {
    Leaf(Matcher, C),
    Fork(Matcher, Vec<Node<C>>),
}

#[derive(Debug, Clone)]
pub struct Router<C> {
    nodes: Vec<Node<C>>,
}

impl<C> Router<C> {
    pub fn new(nodes: Vec<Node<C>>) -> Self {
        Self { nodes }
    }

    pub fn route(&self, message: &Incoming) -> Option<&C> {
        dfs(&self.nodes, message)
    }
}

fn dfs<'a, C>(nodes: &'a [Node<C>], message: &Incoming) -> Option<&'a C> {
    for node in nodes {
        match node {
            Node::Leaf(matcher, command) if matcher.matches(message) => return Some(command),
            Node::Fork(matcher, children) if matcher.matches(message) => {
                if let Some(command) = dfs(children, message) {
                    return Some(command);
                }
            }
            _ => {}
        }
    }
    None
}
