pub mod engine;

pub use engine::{
    aggregate_participation, aggregate_results_department, aggregate_results_national,
    NationalTally, ParticipationAggregate, PartyTally,
};
