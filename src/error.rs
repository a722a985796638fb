//! Rich diagnostic error types for the mediation layer.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]`
//! derives, providing error codes and help text. All errors are local to the
//! tick, message, or action that produced them; the scheduling loop never
//! dies because one message was malformed.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the mediation layer.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain through to the embedding application.
#[derive(Debug, Error, Diagnostic)]
pub enum BdiError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Belief(#[from] BeliefError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Reasoner(#[from] ReasonerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Transport(#[from] crate::transport::TransportError),
}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

/// Decoding failures for wire-form term bodies. Malformed input is fatal for
/// the message that carried it; the codec attempts no partial recovery.
#[derive(Debug, Error, Diagnostic)]
pub enum CodecError {
    #[error("empty functor in term body: {input:?}")]
    #[diagnostic(
        code(medu::codec::empty_functor),
        help("A term body must start with a functor name, e.g. `likes(mary,wine)`.")
    )]
    EmptyFunctor { input: String },

    #[error("unbalanced delimiters in term body: {input:?}")]
    #[diagnostic(
        code(medu::codec::unbalanced),
        help("Check that every `(` and `[` in the body has a matching closer.")
    )]
    Unbalanced { input: String },

    #[error("unterminated string literal in term body: {input:?}")]
    #[diagnostic(
        code(medu::codec::unterminated_string),
        help("String arguments must be wrapped in matching double quotes.")
    )]
    UnterminatedString { input: String },

    #[error("invalid argument {fragment:?}: {reason}")]
    #[diagnostic(
        code(medu::codec::invalid_argument),
        help(
            "Arguments are numbers, quoted strings, atoms, variables, or \
             nested `[..]` lists."
        )
    )]
    InvalidArgument { fragment: String, reason: String },

    #[error("trailing input after term: {fragment:?}")]
    #[diagnostic(
        code(medu::codec::trailing_input),
        help("Nothing may follow the closing delimiter except an annotation block.")
    )]
    TrailingInput { fragment: String },
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Violations of the mediation message protocol. Fatal to the operation that
/// triggered them; subsequent ticks are unaffected.
#[derive(Debug, Error, Diagnostic)]
pub enum ProtocolError {
    #[error("unknown illocutionary force: {ilf}")]
    #[diagnostic(
        code(medu::protocol::unknown_performative),
        help(
            "Recognized performatives are tell, untell, achieve, unachieve, \
             tellHow, untellHow, and askHow."
        )
    )]
    UnknownPerformative { ilf: String },

    #[error("message carries no ilf_type metadata")]
    #[diagnostic(
        code(medu::protocol::missing_ilf),
        help(
            "Mediation messages must carry an `ilf_type` metadata field next \
             to the `performative` tag."
        )
    )]
    MissingIlf,

    #[error("plan query carries no source annotation")]
    #[diagnostic(
        code(medu::protocol::missing_source),
        help(
            "A plan query must be annotated with `source(<requester>)` so the \
             matching plans can be sent back."
        )
    )]
    MissingSource,
}

// ---------------------------------------------------------------------------
// Belief errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum BeliefError {
    /// The signature is known to the belief base but currently holds zero
    /// facts. Distinct from an entirely unknown signature, which is not an
    /// error (`get_belief` returns `None`).
    #[error("belief not initiated: {key}")]
    #[diagnostic(
        code(medu::belief::not_initiated),
        help(
            "The belief family exists but holds no current fact. It was \
             declared or retracted without a subsequent assertion; \
             call `set_belief` first."
        )
    )]
    NotInitiated { key: String },
}

// ---------------------------------------------------------------------------
// Reasoner errors
// ---------------------------------------------------------------------------

/// Failures surfaced by the reasoning-engine collaborator.
#[derive(Debug, Error, Diagnostic)]
pub enum ReasonerError {
    #[error("plan source could not be built: {message}")]
    #[diagnostic(
        code(medu::reasoner::build),
        help("Check the plan-definition source for syntax errors.")
    )]
    Build { message: String },

    #[error("invalid plan definition: {line:?}")]
    #[diagnostic(
        code(medu::reasoner::invalid_plan),
        help(
            "Plan definitions start with a `+` or `-` trigger, an optional \
             `!`/`?` goal marker, and a head term, e.g. `+!ping(X) <- ...`."
        )
    )]
    InvalidPlan { line: String },

    #[error("engine rejected mental update: {message}")]
    #[diagnostic(
        code(medu::reasoner::update_rejected),
        help("The reasoning engine could not apply this trigger/goal-type combination.")
    )]
    UpdateRejected { message: String },

    #[error("no action registered for {name}/{arity}")]
    #[diagnostic(
        code(medu::reasoner::unknown_action),
        help("Register the action in the ActionRegistry before constructing the agent.")
    )]
    UnknownAction { name: String, arity: usize },
}

/// Convenience alias for mediation-layer results.
pub type BdiResult<T> = std::result::Result<T, BdiError>;
