use choreo_shared::{ChoreographerId, ConnectionKey};

use super::server::ChoreoServer;

pub struct ViewersRef<'s> {
    server: &'s ChoreoServer,
    id: ChoreographerId,
}

impl<'s> ViewersRef<'s> {
    pub(crate) fn new(server: &'s ChoreoServer, id: ChoreographerId) -> Self {
        Self { server, id }
    }

    /// Returns true if the connection may see the performance
    pub fn has(&self, key: &ConnectionKey) -> bool {
        self.server.performance_visible_to(self.id, key)
    }
}

pub struct ViewersMut<'s> {
    server: &'s mut ChoreoServer,
    id: ChoreographerId,
}

impl<'s> ViewersMut<'s> {
    pub(crate) fn new(server: &'s mut ChoreoServer, id: ChoreographerId) -> Self {
        Self { server, id }
    }

    /// Returns true if the connection may see the performance
    pub fn has(&self, key: &ConnectionKey) -> bool {
        self.server.performance_visible_to(self.id, key)
    }

    /// Adds a connection to the explicit viewer list. Once the list is not
    /// empty only listed connections see the performance.
    pub fn include(&mut self, key: &ConnectionKey) -> &mut Self {
        self.server.set_explicit_viewer(self.id, key, true);

        self
    }

    /// Removes a connection from the explicit viewer list
    pub fn exclude(&mut self, key: &ConnectionKey) -> &mut Self {
        self.server.set_explicit_viewer(self.id, key, false);

        self
    }

    /// Empties the list, making the performance visible to everyone again
    pub fn clear(&mut self) -> &mut Self {
        self.server.clear_explicit_viewers(self.id);

        self
    }
}
