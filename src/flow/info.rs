//! Flow summary value type and its merge operations
//!
//! A `FlowInfo` describes one subtree: how control leaves it, which locals
//! it touches first and how, which branch targets are still pending and
//! which exceptions escape. Summaries are produced at leaves and combined
//! upward; merge only ever adds information.

use std::collections::BTreeSet;
use std::ops::{BitOr, BitOrAssign};

use serde::Serialize;

use crate::flow::context::{ComputeMode, FlowContext};
use crate::tree::{CaughtTypes, LocalId, TypeId, TypeRegistry, TypeVarId};

/// First access recorded for a local within a summarized region.
///
/// "Potential" modes mean the access happens on some but not all paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    #[default]
    Unused,
    Read,
    ReadPotential,
    Write,
    WritePotential,
    Unknown,
}

use AccessMode::*;

/// Control-transfer flags. A region with both an exit flag and `NO_RETURN`
/// returns on some paths and falls through on others (partial return).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FlowFlags(u8);

impl FlowFlags {
    pub const NO_RETURN: FlowFlags = FlowFlags(1);
    pub const VOID_RETURN: FlowFlags = FlowFlags(1 << 1);
    pub const VALUE_RETURN: FlowFlags = FlowFlags(1 << 2);
    pub const THROW: FlowFlags = FlowFlags(1 << 3);

    const EXITS: FlowFlags = FlowFlags(Self::VOID_RETURN.0 | Self::VALUE_RETURN.0 | Self::THROW.0);
    const RETURNS: FlowFlags = FlowFlags(Self::VOID_RETURN.0 | Self::VALUE_RETURN.0);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: FlowFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn intersects(self, other: FlowFlags) -> bool {
        self.0 & other.0 != 0
    }

    pub fn remove(&mut self, other: FlowFlags) {
        self.0 &= !other.0;
    }

    pub fn insert(&mut self, other: FlowFlags) {
        self.0 |= other.0;
    }
}

impl BitOr for FlowFlags {
    type Output = FlowFlags;
    fn bitor(self, rhs: FlowFlags) -> FlowFlags {
        FlowFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for FlowFlags {
    fn bitor_assign(&mut self, rhs: FlowFlags) {
        self.0 |= rhs.0;
    }
}

// First-access combination for two regions executed one after the other.
// Rows are the earlier mode, columns the later; a definite first access
// absorbs everything that follows.
const ACCESS_MODE_SEQUENTIAL: [[AccessMode; 6]; 6] = [
    /* Unused    */ [Unused, Read, ReadPotential, Write, WritePotential, Unknown],
    /* Read      */ [Read, Read, Read, Read, Read, Read],
    /* ReadPot   */ [ReadPotential, Read, ReadPotential, Unknown, Unknown, Unknown],
    /* Write     */ [Write, Write, Write, Write, Write, Write],
    /* WritePot  */ [WritePotential, Unknown, Unknown, Write, WritePotential, Unknown],
    /* Unknown   */ [Unknown, Unknown, Unknown, Unknown, Unknown, Unknown],
];

// Access combination for two alternative branches: agreement keeps the
// real mode, one-sided access becomes potential, read/write conflict is
// unknowable without path information.
const ACCESS_MODE_CONDITIONAL: [[AccessMode; 6]; 6] = [
    /* Unused    */
    [Unused, ReadPotential, ReadPotential, WritePotential, WritePotential, Unknown],
    /* Read      */ [ReadPotential, Read, ReadPotential, Unknown, Unknown, Unknown],
    /* ReadPot   */ [ReadPotential, ReadPotential, ReadPotential, Unknown, Unknown, Unknown],
    /* Write     */ [WritePotential, Unknown, Unknown, Write, WritePotential, Unknown],
    /* WritePot  */ [WritePotential, Unknown, Unknown, WritePotential, WritePotential, Unknown],
    /* Unknown   */ [Unknown, Unknown, Unknown, Unknown, Unknown, Unknown],
];

// Demotion applied to accesses that may be skipped by a pending branch or
// a zero-iteration loop.
const ACCESS_MODE_OPEN_BRANCH: [AccessMode; 6] = [
    Unused,
    ReadPotential,
    ReadPotential,
    WritePotential,
    WritePotential,
    Unknown,
];

fn sequential_access(mode: ComputeMode, this: AccessMode, other: AccessMode) -> AccessMode {
    let base = ACCESS_MODE_SEQUENTIAL[this as usize][other as usize];
    match mode {
        ComputeMode::Merge => base,
        ComputeMode::Arguments => match (this, other) {
            // A read behind a potential write may still be the first
            // access on the path without the write.
            (WritePotential, Read) => Read,
            (WritePotential, ReadPotential) => ReadPotential,
            _ => base,
        },
        ComputeMode::ReturnValues => match (this, other) {
            // Later definite writes matter more than earlier reads.
            (Read | ReadPotential, Write) => Write,
            (Read | ReadPotential, WritePotential) => WritePotential,
            _ => base,
        },
    }
}

fn reentrance_access(this: AccessMode, other: AccessMode) -> AccessMode {
    match this {
        // First accesses decided on every path of the first iteration
        // stay decided.
        Read | Write => this,
        _ => ACCESS_MODE_CONDITIONAL[this as usize][other as usize],
    }
}

/// Composable flow summary of one subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowInfo {
    flags: FlowFlags,
    accesses: Option<Vec<AccessMode>>,
    branches: BTreeSet<Option<String>>,
    exceptions: BTreeSet<TypeId>,
    type_variables: BTreeSet<TypeVarId>,
}

impl FlowInfo {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Leaf summary for a `return`, with or without a value.
    pub fn returning(has_value: bool) -> Self {
        let mut info = Self::default();
        info.flags = if has_value {
            FlowFlags::VALUE_RETURN
        } else {
            FlowFlags::VOID_RETURN
        };
        info
    }

    /// Leaf summary for a `throw`.
    pub fn throwing() -> Self {
        let mut info = Self::default();
        info.flags = FlowFlags::THROW;
        info
    }

    /// Leaf summary for a `break`/`continue`; `None` is an unlabeled jump.
    pub fn branch(label: Option<String>) -> Self {
        let mut info = Self::default();
        info.branches.insert(label);
        info
    }

    /// Leaf summary for one access to a local variable.
    ///
    /// Accesses outside the tracking window, or while access recording is
    /// off, produce an empty summary.
    pub fn local_access(local: LocalId, mode: AccessMode, context: &mut FlowContext) -> Self {
        let mut info = Self::default();
        if !context.consider_access_mode() {
            return info;
        }
        if let Some(index) = context.index_of(local) {
            context.manage_local(local);
            info.ensure_accesses(context.window_len())[index] = mode;
        }
        info
    }

    /// Leaf summary for a reference to a free type variable.
    pub fn type_variable(var: TypeVarId) -> Self {
        let mut info = Self::default();
        info.type_variables.insert(var);
        info
    }

    // ---- Queries -----------------------------------------------------

    /// Whether control can reach the end of the region.
    pub fn falls_through(&self) -> bool {
        self.flags.is_empty() || self.flags.contains(FlowFlags::NO_RETURN)
    }

    /// Every path returns a consistent way (value or void).
    pub fn is_return(&self) -> bool {
        self.flags.intersects(FlowFlags::RETURNS) && !self.falls_through()
    }

    /// Some paths return while others fall through.
    pub fn is_partial_return(&self) -> bool {
        self.flags.intersects(FlowFlags::RETURNS) && self.flags.contains(FlowFlags::NO_RETURN)
    }

    pub fn is_value_return(&self) -> bool {
        self.flags.contains(FlowFlags::VALUE_RETURN)
    }

    pub fn is_throw(&self) -> bool {
        self.flags.contains(FlowFlags::THROW)
    }

    /// Pending branch targets that no enclosing construct resolved.
    pub fn branches(&self) -> &BTreeSet<Option<String>> {
        &self.branches
    }

    pub fn has_branches(&self) -> bool {
        !self.branches.is_empty()
    }

    pub fn exceptions(&self) -> &BTreeSet<TypeId> {
        &self.exceptions
    }

    pub fn type_variables(&self) -> &BTreeSet<TypeVarId> {
        &self.type_variables
    }

    /// Recorded first-access mode for a tracked local.
    pub fn access_mode(&self, context: &FlowContext, local: LocalId) -> AccessMode {
        match (context.index_of(local), &self.accesses) {
            (Some(index), Some(accesses)) => accesses[index],
            _ => Unused,
        }
    }

    /// Enumerates `(window index, mode)` for every non-`Unused` access.
    pub fn accesses(&self) -> impl Iterator<Item = (usize, AccessMode)> + '_ {
        self.accesses
            .iter()
            .flatten()
            .enumerate()
            .filter(|(_, mode)| **mode != Unused)
            .map(|(i, mode)| (i, *mode))
    }

    // ---- Merge operations --------------------------------------------

    /// Sequential composition: `other` executes after `self`.
    ///
    /// The left operand dominates the control outcome; accesses reached
    /// only after an unconditional exit are still recorded so dead but
    /// referenced variables are not dropped. Accesses behind a pending
    /// branch are demoted to potential.
    pub fn merge_sequential(&mut self, other: Option<FlowInfo>, context: &FlowContext) {
        let Some(other) = other else { return };
        let had_open_branches = self.has_branches();
        self.merge_access_sequential(&other, had_open_branches, context);
        self.merge_flags_sequential(other.flags);
        self.branches.extend(other.branches);
        self.exceptions.extend(other.exceptions);
        self.type_variables.extend(other.type_variables);
    }

    /// Merge with an alternative branch: `self` and `other` are the two
    /// arms, either of which may execute. `None` stands for a missing arm
    /// that falls straight through.
    pub fn merge_conditional(&mut self, other: Option<FlowInfo>, context: &FlowContext) {
        let other = other.unwrap_or_default();
        self.flags = branch_flags(&self.flags, self.falls_through())
            | branch_flags(&other.flags, other.falls_through());
        self.merge_access_conditional(&other, context);
        self.branches.extend(other.branches);
        self.exceptions.extend(other.exceptions);
        self.type_variables.extend(other.type_variables);
    }

    /// In-place merge against an empty alternative: the region may be
    /// skipped entirely (zero-iteration loop, missing default case).
    pub fn merge_empty_condition(&mut self, context: &FlowContext) {
        if self.flags.intersects(FlowFlags::EXITS) {
            self.flags.insert(FlowFlags::NO_RETURN);
        }
        if !context.consider_access_mode() {
            return;
        }
        if let Some(accesses) = &mut self.accesses {
            for access in accesses.iter_mut() {
                *access = ACCESS_MODE_OPEN_BRANCH[*access as usize];
            }
        }
    }

    /// Records an exception that may escape; unresolved types are ignored.
    pub fn merge_exception(&mut self, exception: Option<TypeId>) {
        if let Some(ty) = exception {
            self.exceptions.insert(ty);
        }
    }

    /// Drops escaping exceptions captured by the given catch clauses.
    pub fn remove_exceptions(&mut self, handlers: &[CaughtTypes], types: &TypeRegistry) {
        self.exceptions
            .retain(|&e| !handlers.iter().any(|h| h.catches(e, types)));
    }

    /// Resolves a branch target once the construct owning it is merged.
    pub fn remove_label(&mut self, label: Option<&str>) {
        self.branches.remove(&label.map(str::to_string));
    }

    /// Drops type variables bound by the construct that declared them, so
    /// only genuinely free ones escape upward.
    pub fn remove_type_variables(&mut self, bound: &[TypeVarId]) {
        for var in bound {
            self.type_variables.remove(var);
        }
    }

    /// Forces a local's recorded access to `Unknown`; used by the
    /// selection-boundary pass for variables declared inside the selection.
    pub fn clear_access_mode(&mut self, local: LocalId, context: &FlowContext) {
        if let (Some(index), Some(accesses)) = (context.index_of(local), &mut self.accesses) {
            accesses[index] = Unknown;
        }
    }

    /// Discards control-transfer facts; the construct (nested function or
    /// class body) keeps its accesses but cannot exit the selection.
    pub fn set_no_return(&mut self) {
        self.flags = FlowFlags::NO_RETURN;
    }

    // ---- Internals ---------------------------------------------------

    fn ensure_accesses(&mut self, len: usize) -> &mut Vec<AccessMode> {
        self.accesses.get_or_insert_with(|| vec![Unused; len])
    }

    fn merge_flags_sequential(&mut self, other: FlowFlags) {
        if other.is_empty() || !self.falls_through() {
            return;
        }
        self.flags.remove(FlowFlags::NO_RETURN);
        self.flags.insert(other);
    }

    fn merge_access_sequential(
        &mut self,
        other: &FlowInfo,
        had_open_branches: bool,
        context: &FlowContext,
    ) {
        if !context.consider_access_mode() {
            return;
        }
        let Some(other_accesses) = &other.accesses else {
            return;
        };
        let reentrance = context.is_loop_reentrance();
        let mode = context.compute_mode();
        let accesses = self.ensure_accesses(context.window_len());
        for (index, &other_access) in other_accesses.iter().enumerate() {
            if other_access == Unused {
                continue;
            }
            let other_access = if had_open_branches {
                ACCESS_MODE_OPEN_BRANCH[other_access as usize]
            } else {
                other_access
            };
            let this_access = accesses[index];
            accesses[index] = if reentrance {
                reentrance_access(this_access, other_access)
            } else {
                sequential_access(mode, this_access, other_access)
            };
        }
    }

    fn merge_access_conditional(&mut self, other: &FlowInfo, context: &FlowContext) {
        if !context.consider_access_mode() {
            return;
        }
        if self.accesses.is_none() && other.accesses.is_none() {
            return;
        }
        let accesses = self.ensure_accesses(context.window_len());
        for (index, access) in accesses.iter_mut().enumerate() {
            let other_access = other
                .accesses
                .as_ref()
                .map(|a| a[index])
                .unwrap_or(Unused);
            *access = ACCESS_MODE_CONDITIONAL[*access as usize][other_access as usize];
        }
    }
}

fn branch_flags(flags: &FlowFlags, falls_through: bool) -> FlowFlags {
    if falls_through {
        *flags | FlowFlags::NO_RETURN
    } else {
        *flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{LocalKind, SyntaxTree};
    use pretty_assertions::assert_eq;

    fn tree_with_locals(count: usize) -> SyntaxTree {
        let mut tree = SyntaxTree::new();
        for i in 0..count {
            tree.add_local(&format!("v{i}"), LocalKind::Let);
        }
        tree
    }

    fn access(context: &mut FlowContext, index: u32, mode: AccessMode) -> FlowInfo {
        FlowInfo::local_access(LocalId(index), mode, context)
    }

    #[test]
    fn test_sequential_first_access_wins() {
        let tree = tree_with_locals(1);
        let mut context = FlowContext::for_tree(&tree);

        let mut info = access(&mut context, 0, Write);
        let read = access(&mut context, 0, Read);
        info.merge_sequential(Some(read), &context);

        assert_eq!(info.access_mode(&context, LocalId(0)), Write);
    }

    #[test]
    fn test_sequential_associativity() {
        let tree = tree_with_locals(3);
        let mut context = FlowContext::for_tree(&tree);

        let samples = [
            access(&mut context, 0, Write),
            access(&mut context, 1, Read),
            FlowInfo::returning(true),
            access(&mut context, 0, Read),
            access(&mut context, 2, WritePotential),
            FlowInfo::throwing(),
            FlowInfo::empty(),
        ];

        for a in &samples {
            for b in &samples {
                for c in &samples {
                    let mut left = a.clone();
                    left.merge_sequential(Some(b.clone()), &context);
                    left.merge_sequential(Some(c.clone()), &context);

                    let mut right_tail = b.clone();
                    right_tail.merge_sequential(Some(c.clone()), &context);
                    let mut right = a.clone();
                    right.merge_sequential(Some(right_tail), &context);

                    assert_eq!(left, right);
                }
            }
        }
    }

    #[test]
    fn test_conditional_promotion() {
        let tree = tree_with_locals(3);
        let mut context = FlowContext::for_tree(&tree);

        // v0 written in both arms, v1 written in one, v2 untouched.
        let mut then_arm = access(&mut context, 0, Write);
        then_arm.merge_sequential(Some(access(&mut context, 1, Write)), &context);
        let else_arm = access(&mut context, 0, Write);

        let mut merged = then_arm;
        merged.merge_conditional(Some(else_arm), &context);

        assert_eq!(merged.access_mode(&context, LocalId(0)), Write);
        assert_eq!(merged.access_mode(&context, LocalId(1)), WritePotential);
        assert_eq!(merged.access_mode(&context, LocalId(2)), Unused);
    }

    #[test]
    fn test_conditional_read_write_conflict_is_unknown() {
        let tree = tree_with_locals(1);
        let mut context = FlowContext::for_tree(&tree);

        let mut merged = access(&mut context, 0, Read);
        merged.merge_conditional(Some(access(&mut context, 0, Write)), &context);

        assert_eq!(merged.access_mode(&context, LocalId(0)), Unknown);
    }

    #[test]
    fn test_conditional_return_flags() {
        let tree = tree_with_locals(0);
        let context = FlowContext::for_tree(&tree);

        // Both arms return: still a full return.
        let mut both = FlowInfo::returning(true);
        both.merge_conditional(Some(FlowInfo::returning(true)), &context);
        assert!(both.is_return());
        assert!(!both.is_partial_return());

        // Missing else arm: partial.
        let mut partial = FlowInfo::returning(true);
        partial.merge_conditional(None, &context);
        assert!(!partial.is_return());
        assert!(partial.is_partial_return());
    }

    #[test]
    fn test_dead_code_accesses_preserved() {
        let tree = tree_with_locals(1);
        let mut context = FlowContext::for_tree(&tree);

        let mut info = FlowInfo::returning(true);
        info.merge_sequential(Some(access(&mut context, 0, Read)), &context);

        assert!(info.is_return());
        assert_eq!(info.access_mode(&context, LocalId(0)), Read);
    }

    #[test]
    fn test_open_branch_demotes_later_accesses() {
        let tree = tree_with_locals(1);
        let mut context = FlowContext::for_tree(&tree);

        let mut info = FlowInfo::branch(None);
        info.merge_sequential(Some(access(&mut context, 0, Write)), &context);

        assert_eq!(info.access_mode(&context, LocalId(0)), WritePotential);
        assert!(info.has_branches());

        info.remove_label(None);
        assert!(!info.has_branches());
    }

    #[test]
    fn test_empty_condition_demotes() {
        let tree = tree_with_locals(1);
        let mut context = FlowContext::for_tree(&tree);

        let mut info = access(&mut context, 0, Write);
        info.merge_sequential(Some(FlowInfo::returning(false)), &context);
        info.merge_empty_condition(&context);

        assert_eq!(info.access_mode(&context, LocalId(0)), WritePotential);
        assert!(info.is_partial_return());
    }

    #[test]
    fn test_remove_exceptions_respects_supertypes() {
        let mut tree = tree_with_locals(0);
        let error = tree.types.lookup("Error").unwrap();
        let base = tree.types.intern("BaseError");
        let sub = tree.types.intern("SubError");
        tree.types.set_parent(base, error);
        tree.types.set_parent(sub, base);

        let mut info = FlowInfo::throwing();
        info.merge_exception(Some(sub));
        info.remove_exceptions(&[CaughtTypes::Types(vec![base])], &tree.types);
        assert!(info.exceptions().is_empty());

        let mut escaping = FlowInfo::throwing();
        escaping.merge_exception(Some(base));
        escaping.remove_exceptions(&[CaughtTypes::Types(vec![sub])], &tree.types);
        assert_eq!(escaping.exceptions().len(), 1);
    }

    #[test]
    fn test_clear_access_mode() {
        let tree = tree_with_locals(1);
        let mut context = FlowContext::for_tree(&tree);

        let mut info = access(&mut context, 0, Write);
        info.clear_access_mode(LocalId(0), &context);
        assert_eq!(info.access_mode(&context, LocalId(0)), Unknown);
    }

    #[test]
    fn test_access_mode_ignored_when_disabled() {
        let tree = tree_with_locals(1);
        let mut context = FlowContext::for_tree(&tree);
        context.set_consider_access_mode(false);

        let info = access(&mut context, 0, Write);
        assert_eq!(info.access_mode(&context, LocalId(0)), Unused);
    }

    #[test]
    fn test_arguments_mode_keeps_read_after_potential_write() {
        let tree = tree_with_locals(1);
        let mut context = FlowContext::for_tree(&tree);

        let potential_write = access(&mut context, 0, WritePotential);
        let read = access(&mut context, 0, Read);

        let mut merged = potential_write.clone();
        merged.merge_sequential(Some(read.clone()), &context);
        assert_eq!(merged.access_mode(&context, LocalId(0)), Unknown);

        context.set_compute_mode(ComputeMode::Arguments);
        let mut merged = potential_write;
        merged.merge_sequential(Some(read), &context);
        assert_eq!(merged.access_mode(&context, LocalId(0)), Read);
    }

    #[test]
    fn test_return_values_mode_surfaces_later_write() {
        let tree = tree_with_locals(1);
        let mut context = FlowContext::for_tree(&tree);
        context.set_compute_mode(ComputeMode::ReturnValues);

        let mut merged = access(&mut context, 0, Read);
        merged.merge_sequential(Some(access(&mut context, 0, Write)), &context);
        assert_eq!(merged.access_mode(&context, LocalId(0)), Write);
    }
}
