//! Group objects.
//!
//! A group owns its ordered children (sub-groups and datasets, addressed as
//! arena indices) and its attributes. Its object header carries
//! mod-time, attribute-info, group-info, link-info and one creation-ordered
//! link message per direct child. The superblock extension is a bare object
//! header holding only the B-tree K-values message.

use crate::msg::{AttrMsg, LinkMsg, LinkTarget, Msg};

#[derive(Debug)]
pub(crate) struct Group {
    /// Absolute path; the local name lives in the parent group's link list.
    pub path: String,
    pub parent: Option<usize>,
    /// Children in creation order — the order link messages are emitted in.
    /// Sub-groups and datasets share one namespace and one ordering.
    pub children: Vec<(String, LinkTarget)>,
    pub attrs: Vec<AttrMsg>,
    pub msgs: Vec<Msg>,
    /// Superblock extension flavor: no links, no attributes, only the
    /// K-values message.
    pub extension: bool,
}

impl Group {
    pub(crate) fn root() -> Group {
        Group {
            path: "/".into(),
            parent: None,
            children: Vec::new(),
            attrs: Vec::new(),
            msgs: Vec::new(),
            extension: false,
        }
    }

    pub(crate) fn extension() -> Group {
        Group {
            extension: true,
            ..Group::root()
        }
    }

    pub(crate) fn child(path: String, parent: usize) -> Group {
        Group {
            path,
            parent: Some(parent),
            ..Group::root()
        }
    }

    /// Child-name uniqueness spans sub-groups and datasets alike.
    pub(crate) fn has_child(&self, name: &str) -> bool {
        self.children.iter().any(|(n, _)| n == name)
    }

    /// Builds the header message list.
    pub(crate) fn assemble_msgs(&mut self) {
        if self.extension {
            self.msgs = vec![Msg::KValues];
            return;
        }
        let mut msgs = vec![
            Msg::ModTime,
            Msg::AttrInfo {
                max_index: self.attrs.len() as u16,
            },
            Msg::GroupInfo,
            Msg::LinkInfo {
                max_index: self.children.len() as u64,
            },
        ];
        for (order, (name, target)) in self.children.iter().enumerate() {
            msgs.push(Msg::Link(LinkMsg {
                name: name.clone(),
                target: *target,
                order: order as u64,
            }));
        }
        msgs.extend(self.attrs.drain(..).map(Msg::Attribute));
        self.msgs = msgs;
    }
}
