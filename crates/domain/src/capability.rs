use crate::models::Site;

/// A per-comment action the current user may be allowed to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Approve,
    Unapprove,
    Spam,
    Reply,
    Like,
}

bitflags::bitflags! {
    /// The enabled actions attached to a comment (or the note it came from).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CapabilitySet: u8 {
        const APPROVE = 1 << 0;
        const UNAPPROVE = 1 << 1;
        const SPAM = 1 << 2;
        const REPLY = 1 << 3;
        const LIKE = 1 << 4;
    }
}

impl Capability {
    pub const fn as_set(self) -> CapabilitySet {
        match self {
            Self::Approve => CapabilitySet::APPROVE,
            Self::Unapprove => CapabilitySet::UNAPPROVE,
            Self::Spam => CapabilitySet::SPAM,
            Self::Reply => CapabilitySet::REPLY,
            Self::Like => CapabilitySet::LIKE,
        }
    }

    /// Note payloads name their actions like `approve-comment`.
    pub fn from_note_action(name: &str) -> Option<Self> {
        match name {
            "approve-comment" => Some(Self::Approve),
            "unapprove-comment" => Some(Self::Unapprove),
            "spam-comment" => Some(Self::Spam),
            "replyto-comment" => Some(Self::Reply),
            "like-comment" => Some(Self::Like),
            _ => None,
        }
    }
}

impl From<Capability> for CapabilitySet {
    fn from(cap: Capability) -> Self {
        cap.as_set()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = CapabilitySet::empty();
        for cap in iter {
            set |= cap.as_set();
        }
        set
    }
}

// 评论列表进来时默认全部可用，由站点能力再过滤
impl Default for CapabilitySet {
    fn default() -> Self {
        CapabilitySet::all()
    }
}

impl CapabilitySet {
    pub fn has(&self, cap: Capability) -> bool {
        self.contains(cap.as_set())
    }

    pub fn can_moderate(&self) -> bool {
        self.has(Capability::Approve) || self.has(Capability::Unapprove)
    }

    pub fn can_mark_as_spam(&self) -> bool {
        self.has(Capability::Spam)
    }

    pub fn can_reply(&self) -> bool {
        self.has(Capability::Reply)
    }

    pub fn can_trash(&self) -> bool {
        self.can_moderate()
    }

    pub fn can_like(&self, site: Option<&Site>) -> bool {
        self.has(Capability::Like) && site.is_some_and(Site::is_accessed_via_wpcom_rest)
    }

    pub fn can_edit(site: Option<&Site>) -> bool {
        site.is_some_and(|s| s.has_capability_edit_others_posts || s.is_self_hosted_admin)
    }
}
