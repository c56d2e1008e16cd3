//! Deterministic UUIDv5 identifiers for link plans and tasks.
//!
//! The namespace is derived from `NS_TAG`, so the same task sequence always
//! yields the same `plan_id`, which lets facts from separate runs be joined.
use std::fmt::Write;
use uuid::Uuid;

use super::plan::{LinkPlan, LinkTask};
use crate::constants::NS_TAG;

fn namespace() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, NS_TAG.as_bytes())
}

fn serialize_task(t: &LinkTask) -> String {
    match t {
        LinkTask::EnsureSource { path, kind } => format!("S:{kind}:{}", path.display()),
        LinkTask::Link {
            source,
            target,
            replace_symlink,
            adopt,
            ..
        } => format!(
            "L:{}->{}:{}{}",
            source.display(),
            target.display(),
            u8::from(*replace_symlink),
            if *adopt { ":adopt" } else { "" }
        ),
        LinkTask::Conflict { source, target, .. } => {
            format!("C:{}->{}", source.display(), target.display())
        }
        LinkTask::Noop { source, target } => {
            format!("N:{}->{}", source.display(), target.display())
        }
    }
}

#[must_use]
pub fn plan_id(plan: &LinkPlan) -> Uuid {
    let mut s = String::new();
    for t in &plan.tasks {
        s.push_str(&serialize_task(t));
        s.push('\n');
    }
    Uuid::new_v5(&namespace(), s.as_bytes())
}

#[must_use]
pub fn task_id(plan_id: &Uuid, task: &LinkTask, idx: usize) -> Uuid {
    let mut s = serialize_task(task);
    let _ = write!(s, "#{idx}");
    Uuid::new_v5(plan_id, s.as_bytes())
}
