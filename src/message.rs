use crate::model::{DicomEntry, TreeNodeKey};
use crate::rt::RtElementId;
use crate::selection::NodeId;

#[derive(Debug, Clone)]
pub enum Message {
    PickFiles,
    FilesLoaded(Vec<Result<DicomEntry, String>>),
    SelectInstance(usize),
    ToggleNode(TreeNodeKey),
    LoadRt,
    SelectStructureSet(RtElementId),
    SelectPlan(RtElementId),
    ToggleRtNode(NodeId, bool),
}
