/// Session-wide id of a registered choreographer. `0` means "not registered".
pub type ChoreographerId = u32;
/// Index of a template inside the [`Protocol`](crate::Protocol) registry
pub type TemplateIndex = u16;
/// Per-connection index the transport assigned to a ghosted scene object
pub type GhostIndex = u16;
/// Scope id of a networked object that may not be ghosted yet
pub type ScopeId = u32;

pub const UNREGISTERED_ID: ChoreographerId = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}

impl HostType {
    pub fn is_server(self) -> bool {
        self == HostType::Server
    }

    pub fn invert(self) -> Self {
        match self {
            HostType::Server => HostType::Client,
            HostType::Client => HostType::Server,
        }
    }
}

/// Opaque handle to an object living in the host's scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(u32);

impl ObjectRef {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Identifies one observing connection on the server
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey(u64);

impl ConnectionKey {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}
