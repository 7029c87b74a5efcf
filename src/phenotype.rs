//! Building robots from genotypes (rule-index sequences).

use crate::blueprint::RobotBlueprint;
use crate::error::BuildError;
use crate::grammar::Grammar;
use crate::graph::Graph;
use crate::interpreter::RobotInterpreter;
use crate::normalize::{lower, normalize_graph};
use crate::rewrite::GraphRewriter;
use tracing::trace;

/// Applies rule sequences to the grammar's seed graph with a first-match policy.
///
/// A build is a pure function of the sequence and the grammar: the same inputs
/// always produce the same robot.
pub struct PhenotypeBuilder<'g, R> {
    grammar: &'g Grammar,
    rewriter: R,
    interpreter: RobotInterpreter,
}

impl<'g, R: GraphRewriter> PhenotypeBuilder<'g, R> {
    pub fn new(grammar: &'g Grammar, rewriter: R) -> Self {
        Self {
            grammar,
            rewriter,
            interpreter: RobotInterpreter::default(),
        }
    }

    /// Replaces the interpreter used to turn normalized graphs into blueprints.
    pub fn with_interpreter(mut self, interpreter: RobotInterpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn grammar(&self) -> &Grammar {
        self.grammar
    }

    /// Applies `sequence` to the seed graph and returns the terminal graph.
    ///
    /// A rule that matches nowhere leaves the graph unchanged. Every index must
    /// name a rule; negative ones never do.
    pub fn derive(&self, sequence: &[i64]) -> Result<Graph, BuildError> {
        let rule_count = self.grammar.len();
        let rules = sequence
            .iter()
            .enumerate()
            .map(|(position, &index)| {
                usize::try_from(index)
                    .ok()
                    .and_then(|i| self.grammar.rules().get(i))
                    .ok_or(BuildError::InvalidRuleIndex {
                        index,
                        position,
                        rule_count,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut graph = self.grammar.seed().clone();
        for (rule, &index) in rules.into_iter().zip(sequence) {
            let matches = self.rewriter.find_matches(rule, &graph);
            match matches.first() {
                Some(found) => graph = self.rewriter.apply_rule(rule, &graph, found),
                None => trace!(rule = %rule.name, index, "rule has no match, skipped"),
            }
        }
        Ok(graph)
    }

    /// Builds the normalized robot for `sequence`.
    pub fn build(&self, sequence: &[i64]) -> Result<RobotBlueprint, BuildError> {
        let graph = self.derive(sequence)?;
        let (graph, root) = normalize_graph(&graph)?;
        let program = lower(&graph, root);
        trace!(%program, "lowered robot graph");
        Ok(self.interpreter.build_blueprint(&program))
    }
}
