//! Renders terms back into query text.
//!
//! Every binary expression is parenthesised, so the text re-parses to the
//! same tree whatever the precedence of the surrounding operators.

use crate::{
    sql::functor as sql,
    term::{AtomicTerm, NodeTerm, Term, TermWalker, functor},
};

/// Query text that parses back to `term`.
///
/// ```
/// use cohql::{QueryLanguage, unparse};
///
/// let language = QueryLanguage::default();
/// let term = language.parse_filter("a.b == 1 and c in (1, 2)").unwrap();
/// let text = unparse(&term);
/// assert_eq!(language.parse_filter(&text).unwrap(), term);
/// ```
pub fn unparse(term: &Term) -> String {
    Unparser.walk(term)
}

struct Unparser;

impl Unparser {
    fn join(&self, terms: &[Term]) -> String {
        terms.iter().map(|t| self.walk(t)).collect::<Vec<_>>().join(", ")
    }

    fn attribute(&self, node: &NodeTerm, name: &str) -> Option<String> {
        node.find_attribute(name).map(|t| self.walk(t))
    }

    /// Quoted name from a clause such as `from('c')`.
    fn quoted(&self, node: &NodeTerm, name: &str) -> String {
        node.find_attribute(name)
            .and_then(Term::as_atom)
            .map(|atom| AtomicTerm::string(atom.text()).to_string())
            .unwrap_or_default()
    }

    fn alias(&self, node: &NodeTerm) -> String {
        node.find_attribute(sql::ALIAS)
            .and_then(Term::as_atom)
            .map(|atom| format!(" as {}", atom.text()))
            .unwrap_or_default()
    }

    fn where_clause(&self, node: &NodeTerm) -> String {
        self.attribute(node, sql::WHERE)
            .map(|w| format!(" where {}", w))
            .unwrap_or_default()
    }

    fn children_of(&self, node: &NodeTerm, name: &str) -> String {
        node.find_child(name).map(|c| self.join(c.children())).unwrap_or_default()
    }

    fn statement(&self, name: &str, node: &NodeTerm) -> Option<String> {
        let text = match name {
            sql::SELECT => {
                let distinct = node
                    .find_attribute(sql::IS_DISTINCT)
                    .and_then(Term::as_atom)
                    .is_some_and(|a| a.value().as_bool());
                let fields = self.children_of(node, sql::FIELD_LIST);
                let group = self.children_of(node, sql::GROUP_BY);
                format!(
                    "select {}{} from {}{}{}{}",
                    if distinct { "distinct " } else { "" },
                    if fields.is_empty() { "*" } else { fields.as_str() },
                    self.quoted(node, sql::FROM),
                    self.alias(node),
                    self.where_clause(node),
                    if group.is_empty() { String::new() } else { format!(" group by {}", group) },
                )
            }
            sql::DELETE => format!(
                "delete from {}{}{}",
                self.quoted(node, sql::FROM),
                self.alias(node),
                self.where_clause(node)
            ),
            sql::UPDATE => {
                let sets = node
                    .find_child(sql::SET_LIST)
                    .map(|list| {
                        list.children()
                            .iter()
                            .map(|set| match (set.child(1), set.child(2)) {
                                (Some(target), Some(value)) => format!("{} = {}", self.walk(target), self.walk(value)),
                                _ => self.walk(set),
                            })
                            .collect::<Vec<_>>()
                            .join(", ")
                    })
                    .unwrap_or_default();
                format!(
                    "update {}{} set {}{}",
                    self.quoted(node, sql::FROM),
                    self.alias(node),
                    sets,
                    self.where_clause(node)
                )
            }
            sql::INSERT => format!(
                "insert into {}{} value {}",
                self.quoted(node, sql::FROM),
                self.attribute(node, sql::KEY).map(|k| format!(" key {}", k)).unwrap_or_default(),
                self.attribute(node, sql::VALUE).unwrap_or_default()
            ),
            sql::CREATE_CACHE => format!("create cache {}", self.quoted(node, sql::FROM)),
            sql::DROP_CACHE => format!("drop cache {}", self.quoted(node, sql::FROM)),
            sql::TRUNCATE => format!("truncate cache {}", self.quoted(node, sql::FROM)),
            sql::CREATE_INDEX | sql::DROP_INDEX => format!(
                "{} index {} {}",
                if name == sql::CREATE_INDEX { "create" } else { "drop" },
                self.quoted(node, sql::FROM),
                self.attribute(node, sql::EXTRACTOR).unwrap_or_default()
            ),
            sql::EXPLAIN => format!("explain plan for {}", self.attribute(node, sql::PLAN).unwrap_or_default()),
            sql::TRACE => format!("trace {}", self.attribute(node, sql::PLAN).unwrap_or_default()),
            sql::SOURCE => format!("source from file {}", self.quoted(node, sql::FILE)),
            _ => return None,
        };
        Some(text)
    }
}

impl TermWalker for Unparser {
    type Output = String;

    fn accept_atom(&self, atom: &AtomicTerm) -> String {
        atom.to_string()
    }

    fn accept_list(&self, node: &NodeTerm) -> String {
        format!("({})", self.join(node.children()))
    }

    fn accept_identifier(&self, name: &str) -> String {
        name.to_string()
    }

    fn accept_literal(&self, atom: &AtomicTerm) -> String {
        atom.to_string()
    }

    fn accept_binary_operator(&self, op: &str, left: &Term, right: &Term) -> String {
        let left = self.walk(left);
        let pair = |right: &Term| match right.as_node() {
            Some(list) if list.functor() == functor::LIST && list.len() == 2 => {
                Some((self.walk(&list.children()[0]), self.walk(&list.children()[1])))
            }
            _ => None,
        };
        match op {
            "between" => {
                if let Some((low, high)) = pair(right) {
                    return format!("({} between {} and {})", left, low, high);
                }
            }
            "like" | "ilike" => {
                if let Some((pattern, escape)) = pair(right) {
                    return format!("({} {} {} escape {})", left, op, pattern, escape);
                }
            }
            _ => {}
        }
        let op = match op {
            "contains_all" => "contains all",
            "contains_any" => "contains any",
            other => other,
        };
        format!("({} {} {})", left, op, self.walk(right))
    }

    fn accept_unary_operator(&self, op: &str, operand: &Term) -> String {
        if op.chars().all(char::is_alphabetic) {
            format!("{} {}", op, self.walk(operand))
        } else {
            format!("{}({})", op, self.walk(operand))
        }
    }

    fn accept_call(&self, name: &str, call: &NodeTerm) -> String {
        format!("{}({})", name, self.join(call.children()))
    }

    fn accept_path(&self, node: &NodeTerm) -> String {
        node.children().iter().map(|c| self.walk(c)).collect::<Vec<_>>().join(".")
    }

    fn accept_binding(&self, kind: &str, term: &Term) -> String {
        format!("{}{}", kind, self.walk(term))
    }

    fn accept_node(&self, name: &str, node: &NodeTerm) -> String {
        match name {
            functor::LIST_LITERAL => format!("[{}]", self.join(node.children())),
            functor::BAG_LITERAL => format!("{{{}}}", self.join(node.children())),
            functor::PAIR => match (node.child(0), node.child(1)) {
                (Some(key), Some(value)) => format!("{}: {}", self.walk(key), self.walk(value)),
                _ => String::new(),
            },
            _ => self
                .statement(name, node)
                .unwrap_or_else(|| format!("{}({})", name, self.join(node.children()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QueryLanguage;

    fn round_trip(language: &QueryLanguage, text: &str) {
        let term = language.parse_statement(text).unwrap();
        let rendered = unparse(&term);
        let reparsed = language.parse_statement(&rendered).unwrap();
        assert_eq!(reparsed, term, "rendered as {}", rendered);
    }

    #[test]
    fn test_filters_round_trip() {
        let language = QueryLanguage::default();
        for text in [
            "a.b.c == 'x' and not (d > 2 or e <= -3)",
            "age between 18 and 65",
            "name like 'J!_%' escape '!'",
            "tags contains any ('a', 'b')",
            "x not in (1, 2, 3)",
            "key().id == ?1 or name == :name",
            "new Integer(5) == 5",
            "getName() is not null",
            "2 ** 3 ** 2 == 512",
        ] {
            let term = language.parse_filter(text).unwrap();
            let reparsed = language.parse_filter(&unparse(&term)).unwrap();
            assert_eq!(reparsed, term, "{}", text);
        }
    }

    #[test]
    fn test_statements_round_trip() {
        let language = QueryLanguage::default();
        round_trip(&language, "select distinct name, count() from 'people' p where p.age > 21 group by name");
        round_trip(&language, "select * from people");
        round_trip(&language, "delete from 'c' where x == 1");
        round_trip(&language, "update 'c' set a = 1, b.c = a + 1 where d");
        round_trip(&language, "insert into 'c' key 1 value 'one'");
        round_trip(&language, "create index on 'c' address.city");
        round_trip(&language, "explain plan for select * from 'c'");
    }
}
