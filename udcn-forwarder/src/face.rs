//! Faces are the forwarder's only I/O boundary. The trait is deliberately
//! synchronous and non-blocking by contract — a pipeline never suspends
//! mid-invocation, so a face that would block must queue and return.

use std::collections::HashMap;
use std::rc::Rc;

use udcn_common::ndn::{Data, FaceId, Interest};

#[derive(Debug, thiserror::Error)]
pub enum FaceError {
    #[error("face is disconnected")]
    Disconnected,
    #[error("face send queue is full")]
    QueueFull,
}

pub trait Face {
    fn id(&self) -> FaceId;

    /// Local faces (e.g. a loopback or application face) are allowed to
    /// cache Data even when it arrived unsolicited.
    fn is_local(&self) -> bool;

    fn send_interest(&self, interest: &Interest) -> Result<(), FaceError>;
    fn send_data(&self, data: &Data) -> Result<(), FaceError>;
}

/// The live set of faces, keyed by the id the table assigned them.
#[derive(Default)]
pub struct FaceTable {
    faces: HashMap<FaceId, Rc<dyn Face>>,
    next_id: u32,
}

impl FaceTable {
    pub fn new() -> Self {
        Self {
            faces: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn allocate_id(&mut self) -> FaceId {
        let id = FaceId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn add(&mut self, face: Rc<dyn Face>) -> FaceId {
        let id = face.id();
        self.faces.insert(id, face);
        id
    }

    pub fn remove(&mut self, id: FaceId) -> Option<Rc<dyn Face>> {
        self.faces.remove(&id)
    }

    pub fn get(&self, id: FaceId) -> Option<&Rc<dyn Face>> {
        self.faces.get(&id)
    }

    pub fn is_local(&self, id: FaceId) -> bool {
        self.faces.get(&id).map(|f| f.is_local()).unwrap_or(false)
    }
}
