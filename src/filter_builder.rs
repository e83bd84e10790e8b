//! Compiles term trees into filters and extractors.
//!
//! [`FilterBuilder`] is a pure tree walk: every node returns a [`Compiled`]
//! result and nothing is stored between calls, so one builder can compile
//! any number of terms.

use std::collections::HashMap;

use log::debug;

use crate::{
    error::CompileError,
    extractor::{Target, ValueExtractor},
    filter::Filter,
    function::Aggregator,
    language::QueryLanguage,
    term::{AtomicTerm, NodeTerm, Term, TermWalker, functor},
    value::Value,
};

/// Values for `:name` bind variables.
pub type NamedBindings = HashMap<String, Value>;

/// Result of compiling one term.
#[derive(Debug, Clone, PartialEq)]
pub enum Compiled {
    Filter(Filter),
    Extractor(ValueExtractor),
    /// Compile-time constant
    Value(Value),
    List(Vec<Compiled>),
    Aggregator(Aggregator),
}

impl Compiled {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Compiled::Filter(_) => "a filter",
            Compiled::Extractor(_) => "an extractor",
            Compiled::Value(_) => "a value",
            Compiled::List(_) => "a list",
            Compiled::Aggregator(_) => "an aggregator",
        }
    }

    /// Constants fold to values; everything else stays an extractor.
    fn from_extractor(extractor: ValueExtractor) -> Self {
        match extractor {
            ValueExtractor::Constant(value) => Compiled::Value(value),
            other => Compiled::Extractor(other),
        }
    }

    /// The compile-time value, if there is one.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Compiled::Value(value) | Compiled::Extractor(ValueExtractor::Constant(value)) => Some(value),
            Compiled::List(items) => items
                .into_iter()
                .map(Compiled::into_value)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            _ => None,
        }
    }

    pub fn into_extractor(self) -> Result<ValueExtractor, CompileError> {
        match self {
            Compiled::Extractor(extractor) => Ok(extractor),
            Compiled::Value(value) => Ok(ValueExtractor::Constant(value)),
            Compiled::List(items) => {
                let items = items
                    .into_iter()
                    .map(Compiled::into_extractor)
                    .collect::<Result<Vec<_>, _>>()?;
                if items.iter().all(|item| matches!(item, ValueExtractor::Constant(_))) {
                    let values = items
                        .into_iter()
                        .filter_map(|item| match item {
                            ValueExtractor::Constant(value) => Some(value),
                            _ => None,
                        })
                        .collect();
                    return Ok(ValueExtractor::Constant(Value::Array(values)));
                }
                Ok(ValueExtractor::Collection(items))
            }
            Compiled::Filter(filter) => Ok(ValueExtractor::custom(filter.to_string(), move |entry| {
                Value::Boolean(filter.evaluate(entry))
            })),
            Compiled::Aggregator(aggregator) => Err(CompileError::invalid_operand(
                aggregator.kind.name(),
                "is an aggregate and cannot be used as a value",
            )),
        }
    }

    /// Operand of a logical operator: filters, booleans and extracted truth
    /// values all qualify.
    pub fn into_condition(self) -> Result<Filter, CompileError> {
        match self {
            Compiled::Filter(filter) => Ok(filter),
            Compiled::Value(Value::Boolean(b)) => Ok(Filter::from_bool(b)),
            Compiled::Extractor(extractor) => Ok(Filter::Predicate(extractor)),
            other => Err(CompileError::FilterNotSpecified(other.kind_name())),
        }
    }
}

pub struct FilterBuilder<'a> {
    language: &'a QueryLanguage,
    cache: Option<&'a str>,
    bind_vars: &'a [Value],
    named: Option<&'a NamedBindings>,
    alias: Option<&'a str>,
}

impl<'a> FilterBuilder<'a> {
    pub fn new(
        language: &'a QueryLanguage,
        cache: Option<&'a str>,
        bind_vars: &'a [Value],
        named: Option<&'a NamedBindings>,
    ) -> Self {
        FilterBuilder {
            language,
            cache,
            bind_vars,
            named,
            alias: None,
        }
    }

    /// Names the cache entry's value, so `p.name` reads `name` under alias `p`.
    pub fn with_alias(mut self, alias: Option<&'a str>) -> Self {
        self.alias = alias;
        self
    }

    fn is_alias(&self, name: &str) -> bool {
        self.alias.is_some_and(|alias| {
            if self.language.ignores_case() {
                alias.eq_ignore_ascii_case(name)
            } else {
                alias == name
            }
        })
    }

    /// Builder with no cache and no bind variables.
    pub fn for_language(language: &'a QueryLanguage) -> Self {
        FilterBuilder::new(language, None, &[], None)
    }

    pub fn language(&self) -> &'a QueryLanguage {
        self.language
    }

    pub fn cache(&self) -> Option<&'a str> {
        self.cache
    }

    /// Compiles `term` to whatever it denotes.
    pub fn compile(&self, term: &Term) -> Result<Compiled, CompileError> {
        term.accept(self)
    }

    /// Compiles `term` to a filter. Boolean constants become
    /// [`Filter::Always`] / [`Filter::Never`]; anything else that is not a
    /// filter is an error.
    pub fn make_filter(&self, term: &Term) -> Result<Filter, CompileError> {
        let filter = match self.compile(term)? {
            Compiled::Filter(filter) => filter,
            Compiled::Value(Value::Boolean(b)) => Filter::from_bool(b),
            other => return Err(CompileError::FilterNotSpecified(other.kind_name())),
        };
        debug!("compiled filter: {}", filter);
        Ok(filter)
    }

    pub fn make_extractor(&self, term: &Term) -> Result<ValueExtractor, CompileError> {
        self.extractor(term)
    }

    /// Compiles an operand that must produce a value.
    pub fn extractor(&self, term: &Term) -> Result<ValueExtractor, CompileError> {
        self.compile(term)?.into_extractor()
    }

    /// Compiles an operand of a logical operator.
    pub fn condition(&self, term: &Term) -> Result<Filter, CompileError> {
        self.compile(term)?.into_condition()
    }

    /// Compile-time value of `term`, if it is constant.
    pub fn constant(&self, term: &Term) -> Result<Option<Value>, CompileError> {
        Ok(self.compile(term)?.into_value())
    }

    fn realize(&self, target: Target, path: &[String]) -> Result<Compiled, CompileError> {
        self.language
            .extractor_builder()
            .realize(self.cache, target, path)
            .map(Compiled::Extractor)
            .ok_or_else(|| CompileError::UnresolvedProperty(path.join(".")))
    }

    fn negate(&self, operand: &Term) -> Result<Compiled, CompileError> {
        let value = match self.compile(operand)? {
            Compiled::Value(value) => value,
            _ => return Err(CompileError::NonNumericNegation(operand.to_string())),
        };
        let negated = match &value {
            Value::Integer(n) => n.checked_neg().map(Value::Integer),
            Value::Float(f) => Some(Value::Float(-f)),
            Value::Decimal(d) => Some(Value::Decimal(-*d)),
            _ => return Err(CompileError::NonNumericNegation(value.to_string())),
        };
        negated
            .map(Compiled::Value)
            .ok_or_else(|| CompileError::NegationOverflow(value.to_string()))
    }

    /// `new T(args)`: arguments must be constants.
    fn construct(&self, operand: &Term) -> Result<Compiled, CompileError> {
        let call = match operand.as_node() {
            Some(node) if node.functor() == functor::CALL && node.len() == 1 => node.child(0).and_then(Term::as_node),
            _ => None,
        };
        let Some(call) = call else {
            return Err(CompileError::invalid_operand("new", "requires a type name and arguments"));
        };
        let type_name = call.functor();
        let constructor = self
            .language
            .constructor(type_name)
            .ok_or_else(|| CompileError::UnknownType(type_name.to_string()))?;

        let mut args = Vec::with_capacity(call.len());
        for arg in call.children() {
            let value = self.constant(arg)?.ok_or_else(|| {
                CompileError::invalid_operand("new", format!("argument {} is not a constant", arg))
            })?;
            args.push(value);
        }
        constructor(args).map(Compiled::Value)
    }

    fn bag(&self, node: &NodeTerm) -> Result<Compiled, CompileError> {
        let is_map = !node.is_empty() && node.children().iter().all(|c| c.is_functor(functor::PAIR));
        if is_map {
            let mut map = HashMap::new();
            for pair in node.children() {
                let (Some(key), Some(value)) = (pair.child(0), pair.child(1)) else {
                    return Err(CompileError::MalformedTerm(pair.to_string()));
                };
                let key = self.constant(key)?.ok_or_else(|| {
                    CompileError::invalid_operand(":", "map keys must be constants")
                })?;
                let value = self.constant(value)?.ok_or_else(|| {
                    CompileError::invalid_operand(":", "map values must be constants")
                })?;
                map.insert(key.as_string(), value);
            }
            return Ok(Compiled::Value(Value::Object(map)));
        }

        let mut set: Vec<Value> = Vec::new();
        for child in node.children() {
            let value = self.constant(child)?.ok_or_else(|| {
                CompileError::invalid_operand("{", "set elements must be constants")
            })?;
            if !set.iter().any(|v| v.loosely_equals(&value)) {
                set.push(value);
            }
        }
        Ok(Compiled::Value(Value::Array(set)))
    }

    fn bound(&self, name: String, value: Option<&Value>) -> Result<Compiled, CompileError> {
        value
            .cloned()
            .map(Compiled::Value)
            .ok_or(CompileError::UnboundVariable(name))
    }
}

impl TermWalker for FilterBuilder<'_> {
    type Output = Result<Compiled, CompileError>;

    fn accept_atom(&self, atom: &AtomicTerm) -> Self::Output {
        Ok(Compiled::Value(atom.value()))
    }

    fn accept_list(&self, node: &NodeTerm) -> Self::Output {
        node.children()
            .iter()
            .map(|child| self.compile(child))
            .collect::<Result<Vec<_>, _>>()
            .map(Compiled::List)
    }

    fn accept_identifier(&self, name: &str) -> Self::Output {
        if name.eq_ignore_ascii_case("this") || self.is_alias(name) {
            return Ok(Compiled::Extractor(ValueExtractor::Identity));
        }
        // Literal words that reached us as identifiers (case-sensitive tables)
        if name.eq_ignore_ascii_case("null") {
            return Ok(Compiled::Value(Value::Null));
        }
        if name.eq_ignore_ascii_case("true") || name.eq_ignore_ascii_case("false") {
            return Ok(Compiled::Value(Value::Boolean(name.eq_ignore_ascii_case("true"))));
        }
        self.realize(Target::Value, &[name.to_string()])
    }

    fn accept_literal(&self, atom: &AtomicTerm) -> Self::Output {
        Ok(Compiled::Value(atom.value()))
    }

    fn accept_binary_operator(&self, op: &str, left: &Term, right: &Term) -> Self::Output {
        let operator = self
            .language
            .operator(op)
            .ok_or_else(|| CompileError::UnknownOperator(op.to_string()))?;

        if operator.is_conditional() {
            operator.make_filter(left, right, self).map(Compiled::Filter)
        } else {
            operator
                .make_extractor(left, right, self)
                .map(Compiled::from_extractor)
        }
    }

    fn accept_unary_operator(&self, op: &str, operand: &Term) -> Self::Output {
        match op {
            "new" => self.construct(operand),
            "!" => match self.compile(operand)? {
                Compiled::Value(Value::Boolean(b)) => Ok(Compiled::Value(Value::Boolean(!b))),
                other => Ok(Compiled::Filter(Filter::not(other.into_condition()?))),
            },
            "-" => self.negate(operand),
            "+" => self.compile(operand),
            _ => {
                debug!("ignoring unsupported unary operator '{}'", op);
                Ok(Compiled::Value(Value::Null))
            }
        }
    }

    fn accept_call(&self, name: &str, call: &NodeTerm) -> Self::Output {
        if let Some(function) = self.language.function(name) {
            let args = call
                .children()
                .iter()
                .map(|arg| self.compile(arg))
                .collect::<Result<Vec<_>, _>>()?;
            return function(args);
        }
        // `getName()` style accessors
        if call.is_empty() {
            return self.realize(Target::Value, &[format!("{}()", name)]);
        }
        Err(CompileError::UnknownFunction(name.to_string()))
    }

    fn accept_path(&self, node: &NodeTerm) -> Self::Output {
        let mut target = Target::Value;
        let mut path = Vec::with_capacity(node.len());

        for (i, child) in node.children().iter().enumerate() {
            if let Some(name) = child.identifier_name() {
                if !(i == 0 && self.is_alias(name)) {
                    path.push(name.to_string());
                }
                continue;
            }
            let call = match child.as_node() {
                Some(n) if n.functor() == functor::CALL => n.child(0).and_then(Term::as_node),
                _ => None,
            };
            match call {
                // `key().name` / `value().name` pick the root
                Some(call) if i == 0 && call.is_empty() && self.language.is_function(call.functor(), "key") => {
                    target = Target::Key;
                }
                Some(call) if i == 0 && call.is_empty() && self.language.is_function(call.functor(), "value") => {}
                Some(call) if call.is_empty() => path.push(format!("{}()", call.functor())),
                _ => {
                    return Err(CompileError::invalid_operand(
                        ".",
                        format!("cannot navigate through {}", child),
                    ));
                }
            }
        }
        self.realize(target, &path)
    }

    fn accept_binding(&self, kind: &str, term: &Term) -> Self::Output {
        match kind {
            "?" => {
                let index = match term.child(0).and_then(Term::as_atom).map(AtomicTerm::value) {
                    Some(Value::Integer(n)) if n > 0 => n as usize,
                    _ => return Err(CompileError::MalformedTerm(format!("?{}", term))),
                };
                self.bound(format!("?{}", index), self.bind_vars.get(index - 1))
            }
            ":" => {
                let name = term
                    .identifier_name()
                    .ok_or_else(|| CompileError::MalformedTerm(format!(":{}", term)))?;
                self.bound(format!(":{}", name), self.named.and_then(|named| named.get(name)))
            }
            other => Err(CompileError::MalformedTerm(format!("binding kind '{}'", other))),
        }
    }

    fn accept_node(&self, functor: &str, node: &NodeTerm) -> Self::Output {
        match functor {
            functor::LIST_LITERAL => {
                let items = node
                    .children()
                    .iter()
                    .map(|child| self.compile(child))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Compiled::from_extractor(Compiled::List(items).into_extractor()?))
            }
            functor::BAG_LITERAL => self.bag(node),
            _ => Err(CompileError::MalformedTerm(node.to_string())),
        }
    }
}

/// Compiles `term` into a filter for `cache`.
pub fn make_filter_for_cache(
    language: &QueryLanguage,
    cache: Option<&str>,
    term: &Term,
    bind_vars: &[Value],
    named: Option<&NamedBindings>,
) -> Result<Filter, CompileError> {
    FilterBuilder::new(language, cache, bind_vars, named).make_filter(term)
}
