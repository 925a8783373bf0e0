//! Role-based visibility rules.
//!
//! Every access decision in the API funnels through this module: object-level
//! checks via [`allows`], list filtering via the scope helpers. The two paths
//! are deliberately different — Editors see *all* blogs in list responses even
//! though object-level ownership exists elsewhere in the data model, and that
//! broadening must not be "fixed" by reusing the object check for lists.

use crate::entities::blog::BlogStatus;
use crate::entities::comment::CommentStatus;
use crate::entities::user::UserRole;

/// The requesting principal. `id` is the database id used for ownership
/// comparisons against `author_id`/`user_id` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User { id: i64, role: UserRole },
}

impl Actor {
    pub fn role(&self) -> Option<UserRole> {
        match self {
            Actor::Anonymous => None,
            Actor::User { role, .. } => Some(*role),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(UserRole::Admin)
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Actor::Anonymous)
    }

    fn owns(&self, owner_id: i64) -> bool {
        matches!(self, Actor::User { id, .. } if *id == owner_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    /// Status changes: publish/unpublish for blogs, approve/spam for comments.
    Moderate,
}

/// Resource state relevant to a decision. Only what the rules consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Blog { status: BlogStatus, author_id: i64 },
    Comment { status: CommentStatus, author_id: i64 },
    Category,
    Tag,
}

/// Object-level decision table.
pub fn allows(actor: &Actor, target: &Target, op: Operation) -> bool {
    match target {
        Target::Blog { status, .. } => match actor.role() {
            // Admin and Editor: every operation on every blog. The Editor rule
            // intentionally ignores ownership.
            Some(UserRole::Admin) | Some(UserRole::Editor) => true,
            // Viewer and Anonymous: read-only, published only.
            Some(UserRole::Viewer) | None => {
                op == Operation::Read && *status == BlogStatus::Published
            }
        },
        Target::Comment { status, author_id } => match (actor.role(), op) {
            (Some(UserRole::Admin), _) => true,
            // Any authenticated user may comment.
            (Some(_), Operation::Create) => true,
            (Some(UserRole::Editor), Operation::Read) => true,
            (Some(UserRole::Editor), _) => false,
            (Some(UserRole::Viewer), Operation::Read) => {
                *status == CommentStatus::Approved || actor.owns(*author_id)
            }
            (Some(UserRole::Viewer), Operation::Update)
            | (Some(UserRole::Viewer), Operation::Delete) => actor.owns(*author_id),
            (Some(UserRole::Viewer), Operation::Moderate) => false,
            (None, Operation::Read) => *status == CommentStatus::Approved,
            (None, _) => false,
        },
        Target::Category | Target::Tag => match op {
            Operation::Read => true,
            _ => actor.is_admin(),
        },
    }
}

/// How much of the blog table a list/detail query may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlogScope {
    All,
    PublishedOnly,
}

pub fn blog_scope(actor: &Actor) -> BlogScope {
    match actor.role() {
        Some(UserRole::Admin) | Some(UserRole::Editor) => BlogScope::All,
        _ => BlogScope::PublishedOnly,
    }
}

/// How much of a blog's comment thread a query may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentScope {
    All,
    /// Approved comments plus the actor's own, whatever their status.
    ApprovedPlusOwn(i64),
    ApprovedOnly,
}

pub fn comment_scope(actor: &Actor) -> CommentScope {
    match actor {
        Actor::User {
            role: UserRole::Admin | UserRole::Editor,
            ..
        } => CommentScope::All,
        Actor::User { id, .. } => CommentScope::ApprovedPlusOwn(*id),
        Actor::Anonymous => CommentScope::ApprovedOnly,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Actor {
        Actor::User { id: 1, role: UserRole::Admin }
    }
    fn editor() -> Actor {
        Actor::User { id: 2, role: UserRole::Editor }
    }
    fn viewer() -> Actor {
        Actor::User { id: 3, role: UserRole::Viewer }
    }

    fn draft_by(author_id: i64) -> Target {
        Target::Blog { status: BlogStatus::Draft, author_id }
    }
    fn published_by(author_id: i64) -> Target {
        Target::Blog { status: BlogStatus::Published, author_id }
    }

    #[test]
    fn admin_has_full_blog_access() {
        for op in [
            Operation::Read,
            Operation::Create,
            Operation::Update,
            Operation::Delete,
            Operation::Moderate,
        ] {
            assert!(allows(&admin(), &draft_by(99), op));
        }
    }

    #[test]
    fn editor_operates_on_blogs_they_do_not_own() {
        // Ownership does not narrow Editor access.
        assert!(allows(&editor(), &draft_by(99), Operation::Read));
        assert!(allows(&editor(), &draft_by(99), Operation::Update));
        assert!(allows(&editor(), &draft_by(99), Operation::Delete));
        assert!(allows(&editor(), &published_by(99), Operation::Moderate));
    }

    #[test]
    fn viewer_reads_published_blogs_only() {
        assert!(allows(&viewer(), &published_by(99), Operation::Read));
        assert!(!allows(&viewer(), &draft_by(99), Operation::Read));
        // Even their own draft is invisible through the blog rules.
        assert!(!allows(&viewer(), &draft_by(3), Operation::Read));
        assert!(!allows(&viewer(), &published_by(99), Operation::Update));
        assert!(!allows(&viewer(), &published_by(99), Operation::Create));
    }

    #[test]
    fn anonymous_reads_published_blogs_only() {
        assert!(allows(&Actor::Anonymous, &published_by(1), Operation::Read));
        assert!(!allows(&Actor::Anonymous, &draft_by(1), Operation::Read));
        assert!(!allows(&Actor::Anonymous, &published_by(1), Operation::Update));
    }

    #[test]
    fn any_authenticated_user_may_create_comments() {
        let target = Target::Comment { status: CommentStatus::Pending, author_id: 0 };
        assert!(allows(&admin(), &target, Operation::Create));
        assert!(allows(&editor(), &target, Operation::Create));
        assert!(allows(&viewer(), &target, Operation::Create));
        assert!(!allows(&Actor::Anonymous, &target, Operation::Create));
    }

    #[test]
    fn comment_moderation_is_admin_only() {
        let target = Target::Comment { status: CommentStatus::Pending, author_id: 2 };
        assert!(allows(&admin(), &target, Operation::Moderate));
        assert!(!allows(&editor(), &target, Operation::Moderate));
        assert!(!allows(&viewer(), &target, Operation::Moderate));
    }

    #[test]
    fn editor_reads_all_comments_but_never_writes() {
        let own_pending = Target::Comment { status: CommentStatus::Pending, author_id: 2 };
        assert!(allows(&editor(), &own_pending, Operation::Read));
        // Not even their own comment is editable with the Editor role.
        assert!(!allows(&editor(), &own_pending, Operation::Update));
        assert!(!allows(&editor(), &own_pending, Operation::Delete));
    }

    #[test]
    fn viewer_comment_rules_hinge_on_ownership() {
        let own_spam = Target::Comment { status: CommentStatus::Spam, author_id: 3 };
        let other_pending = Target::Comment { status: CommentStatus::Pending, author_id: 9 };
        let other_approved = Target::Comment { status: CommentStatus::Approved, author_id: 9 };

        assert!(allows(&viewer(), &own_spam, Operation::Read));
        assert!(allows(&viewer(), &own_spam, Operation::Update));
        assert!(allows(&viewer(), &own_spam, Operation::Delete));

        assert!(allows(&viewer(), &other_approved, Operation::Read));
        assert!(!allows(&viewer(), &other_pending, Operation::Read));
        assert!(!allows(&viewer(), &other_approved, Operation::Update));
        assert!(!allows(&viewer(), &other_approved, Operation::Delete));
    }

    #[test]
    fn anonymous_reads_approved_comments_only() {
        let approved = Target::Comment { status: CommentStatus::Approved, author_id: 9 };
        let pending = Target::Comment { status: CommentStatus::Pending, author_id: 9 };
        assert!(allows(&Actor::Anonymous, &approved, Operation::Read));
        assert!(!allows(&Actor::Anonymous, &pending, Operation::Read));
    }

    #[test]
    fn taxonomy_writes_are_admin_only() {
        for target in [Target::Category, Target::Tag] {
            assert!(allows(&Actor::Anonymous, &target, Operation::Read));
            assert!(allows(&viewer(), &target, Operation::Read));
            assert!(allows(&admin(), &target, Operation::Create));
            assert!(allows(&admin(), &target, Operation::Delete));
            assert!(!allows(&editor(), &target, Operation::Create));
            assert!(!allows(&viewer(), &target, Operation::Update));
            assert!(!allows(&Actor::Anonymous, &target, Operation::Create));
        }
    }

    #[test]
    fn blog_list_scope_broadens_for_staff_roles() {
        assert_eq!(blog_scope(&admin()), BlogScope::All);
        assert_eq!(blog_scope(&editor()), BlogScope::All);
        assert_eq!(blog_scope(&viewer()), BlogScope::PublishedOnly);
        assert_eq!(blog_scope(&Actor::Anonymous), BlogScope::PublishedOnly);
    }

    #[test]
    fn comment_scope_matches_roles() {
        assert_eq!(comment_scope(&admin()), CommentScope::All);
        assert_eq!(comment_scope(&editor()), CommentScope::All);
        assert_eq!(comment_scope(&viewer()), CommentScope::ApprovedPlusOwn(3));
        assert_eq!(comment_scope(&Actor::Anonymous), CommentScope::ApprovedOnly);
    }
}
