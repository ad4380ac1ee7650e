//! Backend commands queued from UI to backend worker.

use shared::{domain::ProposalId, protocol::CreateProposalRequest};

pub enum BackendCommand {
    /// (Re)connect to a proposal server: fetch pricing and start the live
    /// answer watch.
    Connect {
        server_url: String,
    },
    CreateProposal {
        request: CreateProposalRequest,
    },
    FetchProposal {
        proposal_id: ProposalId,
    },
    /// Fire-and-forget acceptance signal from the proposal card.
    AnswerProposal {
        proposal_id: ProposalId,
        accepted: bool,
    },
}
