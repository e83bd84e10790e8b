use log::debug;

use crate::{
    error::{CompileError, ExecutionError},
    extractor::{Entry, UniversalExtractorBuilder, ValueExtractor},
    filter::Filter,
    filter_builder::{Compiled, NamedBindings},
    function::Aggregator,
    language::QueryLanguage,
    sql::functor,
    term::{NodeTerm, Term, functor as term_functor},
    value::Value,
};

use super::{
    ExecutionContext, Statement, StatementBuilder, StatementResult, builder, cache_name, clause_children,
    where_filter,
};

#[derive(Debug, Clone)]
enum Field {
    Value(ValueExtractor),
    Aggregate(Aggregator),
}

impl Field {
    fn from_compiled(compiled: Compiled) -> Result<Self, CompileError> {
        match compiled {
            Compiled::Aggregator(aggregator) => Ok(Field::Aggregate(aggregator)),
            other => other.into_extractor().map(Field::Value),
        }
    }

    fn is_aggregate(&self) -> bool {
        matches!(self, Field::Aggregate(_))
    }

    /// Evaluates the field over one group of entries.
    fn evaluate(&self, group: &[&Entry]) -> Value {
        match self {
            Field::Aggregate(aggregator) => aggregator.aggregate(group.iter().copied()),
            Field::Value(extractor) => group
                .first()
                .map(|entry| extractor.extract(entry))
                .unwrap_or(Value::Null),
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Value(extractor) => write!(f, "{}", extractor),
            Field::Aggregate(aggregator) => write!(f, "{}", aggregator),
        }
    }
}

fn row(values: Vec<Value>) -> Value {
    match <[Value; 1]>::try_from(values) {
        Ok([single]) => single,
        Err(values) => Value::Array(values),
    }
}

fn dedup(rows: Vec<Value>) -> Vec<Value> {
    let mut unique: Vec<Value> = Vec::with_capacity(rows.len());
    for r in rows {
        if !unique.iter().any(|u| u.loosely_equals(&r)) {
            unique.push(r);
        }
    }
    unique
}

#[derive(Debug)]
pub struct SelectStatement {
    cache: String,
    distinct: bool,
    fields: Vec<Field>,
    filter: Filter,
    group_by: Vec<ValueExtractor>,
}

impl Statement for SelectStatement {
    fn execute(&self, ctx: &mut ExecutionContext) -> Result<StatementResult, ExecutionError> {
        let cache = ctx.store().cache(&self.cache)?;
        let matching: Vec<&Entry> = cache.query(&self.filter).collect();
        debug!("select from '{}': {} matching entries", self.cache, matching.len());

        let rows = if self.fields.is_empty() {
            matching.iter().map(|e| e.value.clone()).collect()
        } else if !self.group_by.is_empty() {
            let mut groups: Vec<(Vec<Value>, Vec<&Entry>)> = Vec::new();
            for entry in matching {
                let key: Vec<Value> = self.group_by.iter().map(|g| g.extract(entry)).collect();
                match groups.iter_mut().find(|(k, _)| {
                    k.len() == key.len() && k.iter().zip(&key).all(|(a, b)| a.loosely_equals(b))
                }) {
                    Some((_, members)) => members.push(entry),
                    None => groups.push((key, vec![entry])),
                }
            }
            groups
                .iter()
                .map(|(_, members)| row(self.fields.iter().map(|f| f.evaluate(members)).collect()))
                .collect()
        } else if self.fields.iter().any(Field::is_aggregate) {
            vec![row(self.fields.iter().map(|f| f.evaluate(&matching)).collect())]
        } else {
            matching
                .iter()
                .map(|entry| row(self.fields.iter().map(|f| f.evaluate(&[*entry])).collect()))
                .collect()
        };

        Ok(StatementResult::Rows(if self.distinct { dedup(rows) } else { rows }))
    }

    fn description(&self) -> String {
        let fields = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(", ")
        };
        let mut plan = format!(
            "select {}{} from '{}' where {}",
            if self.distinct { "distinct " } else { "" },
            fields,
            self.cache,
            self.filter
        );
        if !self.group_by.is_empty() {
            let groups: Vec<String> = self.group_by.iter().map(|g| g.to_string()).collect();
            plan.push_str(&format!(" group by {}", groups.join(", ")));
        }
        plan
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SelectStatementBuilder;

impl StatementBuilder for SelectStatementBuilder {
    fn realize(
        &self,
        language: &QueryLanguage,
        term: &NodeTerm,
        bind_vars: &[Value],
        named: Option<&NamedBindings>,
    ) -> Result<Box<dyn Statement>, CompileError> {
        let cache = cache_name(term)?;
        let b = builder(language, term, &cache, bind_vars, named);

        let distinct = term
            .find_attribute(functor::IS_DISTINCT)
            .and_then(Term::as_atom)
            .is_some_and(|atom| atom.value().as_bool());
        let fields = clause_children(term, functor::FIELD_LIST)
            .iter()
            .map(|field| b.compile(field).and_then(Field::from_compiled))
            .collect::<Result<Vec<_>, _>>()?;
        let group_by = clause_children(term, functor::GROUP_BY)
            .iter()
            .map(|g| b.extractor(g))
            .collect::<Result<Vec<_>, _>>()?;

        if group_by.is_empty()
            && fields.iter().any(Field::is_aggregate)
            && !fields.iter().all(Field::is_aggregate)
        {
            return Err(CompileError::invalid_operand(
                "select",
                "mixes aggregates and plain fields without group by",
            ));
        }

        Ok(Box::new(SelectStatement {
            filter: where_filter(language, term, &cache, bind_vars, named)?,
            cache,
            distinct,
            fields,
            group_by,
        }))
    }
}

#[derive(Debug)]
pub struct DeleteStatement {
    cache: String,
    filter: Filter,
}

impl Statement for DeleteStatement {
    fn execute(&self, ctx: &mut ExecutionContext) -> Result<StatementResult, ExecutionError> {
        let removed = ctx.store_mut().cache_mut(&self.cache)?.remove_matching(&self.filter);
        Ok(StatementResult::Affected(removed))
    }

    fn description(&self) -> String {
        format!("delete from '{}' where {}", self.cache, self.filter)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteStatementBuilder;

impl StatementBuilder for DeleteStatementBuilder {
    fn realize(
        &self,
        language: &QueryLanguage,
        term: &NodeTerm,
        bind_vars: &[Value],
        named: Option<&NamedBindings>,
    ) -> Result<Box<dyn Statement>, CompileError> {
        let cache = cache_name(term)?;
        Ok(Box::new(DeleteStatement {
            filter: where_filter(language, term, &cache, bind_vars, named)?,
            cache,
        }))
    }
}

/// One `property = expression` of an update.
#[derive(Debug)]
struct Assignment {
    path: Vec<String>,
    value: ValueExtractor,
}

/// Writes `value` at `path` inside `target`, creating objects on the way.
fn assign(target: &mut Value, path: &[String], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        *target = value;
        return;
    };
    if !matches!(target, Value::Object(_)) {
        *target = Value::Object(Default::default());
    }
    if let Value::Object(map) = target {
        let slot = map.entry(first.clone()).or_insert(Value::Null);
        assign(slot, rest, value);
    }
}

/// Property path named by the left side of an assignment.
fn assignment_path(term: &Term) -> Result<Vec<String>, CompileError> {
    if let Some(name) = term.identifier_name() {
        return Ok(vec![name.to_string()]);
    }
    let invalid = || CompileError::invalid_operand("set", format!("cannot assign to {}", term));
    let node = term.as_node().ok_or_else(invalid)?;
    let element = |child: &Term| -> Result<Option<String>, CompileError> {
        if let Some(name) = child.identifier_name() {
            return Ok(Some(name.to_string()));
        }
        match child.as_node() {
            Some(call) if call.functor() == term_functor::CALL => match call.child(0).and_then(Term::as_node) {
                Some(inner) if inner.is_empty() && inner.functor().eq_ignore_ascii_case("value") => Ok(None),
                Some(inner) if inner.is_empty() => Ok(Some(format!("{}()", inner.functor()))),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    };

    let elements: Vec<Option<String>> = match node.functor() {
        term_functor::DEREF => node.children().iter().map(element).collect::<Result<_, _>>()?,
        term_functor::CALL => vec![element(term)?],
        _ => return Err(invalid()),
    };
    Ok(elements
        .into_iter()
        .flatten()
        .map(|e| UniversalExtractorBuilder::property_name(&e))
        .collect())
}

#[derive(Debug)]
pub struct UpdateStatement {
    cache: String,
    assignments: Vec<Assignment>,
    filter: Filter,
}

impl Statement for UpdateStatement {
    fn execute(&self, ctx: &mut ExecutionContext) -> Result<StatementResult, ExecutionError> {
        let cache = ctx.store_mut().cache_mut(&self.cache)?;
        let mut updated = 0;
        for entry in cache.entries_mut() {
            if !self.filter.evaluate(entry) {
                continue;
            }
            // Right-hand sides see the entry as it was before the update
            let values: Vec<Value> = self.assignments.iter().map(|a| a.value.extract(entry)).collect();
            for (assignment, value) in self.assignments.iter().zip(values) {
                assign(&mut entry.value, &assignment.path, value);
            }
            updated += 1;
        }
        Ok(StatementResult::Affected(updated))
    }

    fn description(&self) -> String {
        let sets: Vec<String> = self
            .assignments
            .iter()
            .map(|a| format!("{} = {}", a.path.join("."), a.value))
            .collect();
        format!("update '{}' set {} where {}", self.cache, sets.join(", "), self.filter)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateStatementBuilder;

impl StatementBuilder for UpdateStatementBuilder {
    fn realize(
        &self,
        language: &QueryLanguage,
        term: &NodeTerm,
        bind_vars: &[Value],
        named: Option<&NamedBindings>,
    ) -> Result<Box<dyn Statement>, CompileError> {
        let cache = cache_name(term)?;
        let b = builder(language, term, &cache, bind_vars, named);

        let mut assignments = Vec::new();
        for set in clause_children(term, functor::SET_LIST) {
            let (target, expression) = match set.as_node() {
                Some(node) if node.functor() == term_functor::BINARY_OPERATOR && node.len() == 3 => {
                    let op = node.child(0).and_then(Term::as_atom).map(|a| a.text());
                    if op.as_deref() != Some("==") {
                        return Err(CompileError::invalid_operand("set", format!("expected an assignment, found {}", set)));
                    }
                    (&node.children()[1], &node.children()[2])
                }
                _ => {
                    return Err(CompileError::invalid_operand("set", format!("expected an assignment, found {}", set)));
                }
            };
            assignments.push(Assignment {
                path: assignment_path(target)?,
                value: b.extractor(expression)?,
            });
        }

        Ok(Box::new(UpdateStatement {
            filter: where_filter(language, term, &cache, bind_vars, named)?,
            cache,
            assignments,
        }))
    }
}

#[derive(Debug)]
pub struct InsertStatement {
    cache: String,
    key: Option<ValueExtractor>,
    value: ValueExtractor,
}

impl Statement for InsertStatement {
    fn execute(&self, ctx: &mut ExecutionContext) -> Result<StatementResult, ExecutionError> {
        let empty = Entry::new(Value::Null, Value::Null);
        let value = self.value.extract(&empty);
        // Without an explicit key the value is its own key
        let key = match &self.key {
            Some(key) => key.extract(&empty),
            None => value.clone(),
        };
        ctx.store_mut().cache_mut(&self.cache)?.put(key, value);
        Ok(StatementResult::Affected(1))
    }

    fn description(&self) -> String {
        match &self.key {
            Some(key) => format!("insert into '{}' key {} value {}", self.cache, key, self.value),
            None => format!("insert into '{}' value {}", self.cache, self.value),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InsertStatementBuilder;

impl StatementBuilder for InsertStatementBuilder {
    fn realize(
        &self,
        language: &QueryLanguage,
        term: &NodeTerm,
        bind_vars: &[Value],
        named: Option<&NamedBindings>,
    ) -> Result<Box<dyn Statement>, CompileError> {
        let cache = cache_name(term)?;
        let b = builder(language, term, &cache, bind_vars, named);

        let key = term.find_attribute(functor::KEY).map(|k| b.extractor(k)).transpose()?;
        let value = term
            .find_attribute(functor::VALUE)
            .ok_or_else(|| CompileError::MalformedTerm(format!("{} has no value", term.functor())))?;

        Ok(Box::new(InsertStatement {
            key,
            value: b.extractor(value)?,
            cache,
        }))
    }
}
