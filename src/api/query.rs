//! Query filter strings understood by the accsyn API
//!
//! Queries take the form `<entity> WHERE <field><op><value> AND ...`, e.g.
//! `job WHERE code="Daily Backup"` or `task WHERE job.id=5f1a AND status!=excluded`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity kinds this tool touches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Job,
    Task,
    User,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Job => "job",
            EntityKind::Task => "task",
            EntityKind::User => "user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    /// Quoted string literal
    Text(String),
    /// Bare token: ids, statuses
    Bare(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Clause {
    field: String,
    op: Op,
    value: Operand,
}

/// Query builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    entity: EntityKind,
    clauses: Vec<Clause>,
}

impl Query {
    pub fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            clauses: Vec::new(),
        }
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// `field="value"`
    pub fn eq_text(self, field: &str, value: &str) -> Self {
        self.clause(field, Op::Eq, Operand::Text(value.to_string()))
    }

    /// `field=value`
    pub fn eq_bare(self, field: &str, value: &str) -> Self {
        self.clause(field, Op::Eq, Operand::Bare(value.to_string()))
    }

    /// `field!=value`
    pub fn ne_bare(self, field: &str, value: &str) -> Self {
        self.clause(field, Op::Ne, Operand::Bare(value.to_string()))
    }

    fn clause(mut self, field: &str, op: Op, value: Operand) -> Self {
        self.clauses.push(Clause {
            field: field.to_string(),
            op,
            value,
        });
        self
    }

    /// The job with the given code
    pub fn job_by_code(code: &str) -> Self {
        Query::new(EntityKind::Job).eq_text("code", code)
    }

    /// All tasks of a job
    pub fn tasks_of_job(job_id: &str) -> Self {
        Query::new(EntityKind::Task).eq_bare("job.id", job_id)
    }
}

/// Quote a string literal, escaping backslashes and double quotes
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity)?;
        for (i, clause) in self.clauses.iter().enumerate() {
            f.write_str(if i == 0 { " WHERE " } else { " AND " })?;
            let op = match clause.op {
                Op::Eq => "=",
                Op::Ne => "!=",
            };
            match &clause.value {
                Operand::Text(text) => write!(f, "{}{}{}", clause.field, op, quote(text))?,
                Operand::Bare(token) => write!(f, "{}{}{}", clause.field, op, token)?,
            }
        }
        Ok(())
    }
}
