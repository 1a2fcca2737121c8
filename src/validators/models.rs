//! XSD Content Model matching
//!
//! Children of an element are matched against its content model by a
//! backtracking search: each particle consumes between `min` and `max`
//! occurrences of its term, trying more occurrences first; choices try
//! their branches in order; `all` groups accept their members in any
//! order. A successful match binds every child to the declaration (or
//! wildcard) it matched.
//!
//! When no match exists, a second greedy pass over the same model explains
//! why, in terms of missing and unexpected elements. The greedy pass also
//! decides alone when the backtracking step budget runs out.

use tracing::{debug, trace};

use crate::namespaces::QName;

use super::grammar::{ElementId, Grammar};
use super::groups::{Compositor, ModelGroup};
use super::particles::{Particle, Term};
use super::wildcards::{ProcessContents, Wildcard};

/// What a child element was matched by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Binding {
    /// An element declaration (possibly a substitution group member)
    Element(ElementId),
    /// An element wildcard
    Wildcard(ProcessContents),
}

/// Outcome of matching one element's children
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ContentMatch {
    /// Whether the children satisfy the content model
    pub matched: bool,
    /// Binding of each child, by position; `None` for children that could
    /// not be placed
    pub bindings: Vec<Option<Binding>>,
    /// Explanations of a failed match, in child order
    pub errors: Vec<String>,
}

/// Match a sequence of child element names against a content model
pub(crate) fn match_content(
    grammar: &Grammar,
    particle: &Particle,
    children: &[&QName],
    max_steps: usize,
) -> ContentMatch {
    let mut matcher = ModelMatcher::new(grammar, children, max_steps);
    let total = children.len();
    if matcher.match_particle(particle, 0, &mut |_, pos| pos == total) {
        trace!(children = total, steps = matcher.steps, "content model matched");
        return ContentMatch {
            matched: true,
            bindings: matcher.bindings,
            errors: Vec::new(),
        };
    }

    if matcher.exhausted {
        debug!(
            children = total,
            max_steps, "match step budget exhausted, using the greedy match"
        );
    }
    let mut visitor = GreedyVisitor::new(grammar, particle, children);
    visitor.walk_particle(particle);
    visitor.finish();
    ContentMatch {
        matched: matcher.exhausted && visitor.errors.is_empty(),
        bindings: visitor.bindings,
        errors: visitor.errors,
    }
}

/// Declaration that a child named `name` matches in place of `id`
fn element_binding(grammar: &Grammar, id: ElementId, name: &QName) -> Option<ElementId> {
    let declaration = grammar.element(id);
    if &declaration.name == name {
        return Some(id);
    }
    declaration
        .substitutes
        .iter()
        .copied()
        .find(|member| &grammar.element(*member).name == name)
}

fn nullable_particle(grammar: &Grammar, particle: &Particle) -> bool {
    particle.occurs.min == 0 || nullable_term(grammar, &particle.term)
}

fn nullable_term(grammar: &Grammar, term: &Term) -> bool {
    match term {
        Term::Element(_) | Term::Any(_) => false,
        Term::Group(group) => nullable_group(grammar, group),
        Term::GroupRef(id) => nullable_group(grammar, &grammar.group(*id).group),
    }
}

fn nullable_group(grammar: &Grammar, group: &ModelGroup) -> bool {
    match group.compositor {
        Compositor::Sequence | Compositor::All => group
            .particles
            .iter()
            .all(|p| nullable_particle(grammar, p)),
        Compositor::Choice => group
            .particles
            .iter()
            .any(|p| nullable_particle(grammar, p)),
    }
}

/// Check if `term` can begin with a child named `name`
fn starts_term(grammar: &Grammar, term: &Term, name: &QName) -> bool {
    match term {
        Term::Element(id) => element_binding(grammar, *id, name).is_some(),
        Term::Any(wildcard) => wildcard.admits(name.namespace.as_deref()),
        Term::Group(group) => starts_group(grammar, group, name),
        Term::GroupRef(id) => starts_group(grammar, &grammar.group(*id).group, name),
    }
}

fn starts_group(grammar: &Grammar, group: &ModelGroup, name: &QName) -> bool {
    let usable = |p: &&Particle| p.occurs.max != Some(0);
    match group.compositor {
        Compositor::Sequence => {
            for particle in group.particles.iter().filter(usable) {
                if starts_term(grammar, &particle.term, name) {
                    return true;
                }
                if !nullable_particle(grammar, particle) {
                    return false;
                }
            }
            false
        }
        Compositor::Choice | Compositor::All => group
            .particles
            .iter()
            .filter(usable)
            .any(|p| starts_term(grammar, &p.term, name)),
    }
}

/// Names a term may begin with, for messages
fn first_names(grammar: &Grammar, term: &Term, names: &mut Vec<String>) {
    let name = match term {
        Term::Element(id) => grammar.element(*id).name.to_string(),
        Term::Any(wildcard) => format!("any element from {}", wildcard.namespaces),
        Term::Group(group) => return first_names_group(grammar, group, names),
        Term::GroupRef(id) => return first_names_group(grammar, &grammar.group(*id).group, names),
    };
    if !names.contains(&name) {
        names.push(name);
    }
}

fn first_names_group(grammar: &Grammar, group: &ModelGroup, names: &mut Vec<String>) {
    for particle in &group.particles {
        first_names(grammar, &particle.term, names);
        if group.compositor == Compositor::Sequence && !nullable_particle(grammar, particle) {
            break;
        }
    }
}

/// Nesting of pending matches beyond which the greedy match decides alone
const MAX_MATCH_DEPTH: usize = 256;

/// Continuation called with the position after a successful partial match
type Continuation<'k, 'a> = dyn FnMut(&mut ModelMatcher<'a>, usize) -> bool + 'k;

/// Backtracking matcher
pub(crate) struct ModelMatcher<'a> {
    grammar: &'a Grammar,
    children: &'a [&'a QName],
    bindings: Vec<Option<Binding>>,
    steps: usize,
    max_steps: usize,
    depth: usize,
    exhausted: bool,
}

impl<'a> ModelMatcher<'a> {
    fn new(grammar: &'a Grammar, children: &'a [&'a QName], max_steps: usize) -> Self {
        Self {
            grammar,
            children,
            bindings: vec![None; children.len()],
            steps: 0,
            max_steps,
            depth: 0,
            exhausted: false,
        }
    }

    fn tick(&mut self) -> bool {
        self.steps += 1;
        if self.steps > self.max_steps {
            self.exhausted = true;
        }
        !self.exhausted
    }

    /// Run `f` one level deeper; too deep a nesting counts as exhaustion
    fn nested(&mut self, f: impl FnOnce(&mut Self) -> bool) -> bool {
        if self.depth >= MAX_MATCH_DEPTH {
            self.exhausted = true;
            return false;
        }
        self.depth += 1;
        let matched = f(self);
        self.depth -= 1;
        matched
    }

    fn match_particle(
        &mut self,
        particle: &'a Particle,
        pos: usize,
        k: &mut Continuation<'_, 'a>,
    ) -> bool {
        match particle.term {
            Term::Element(_) | Term::Any(_) => self.nested(|m| m.match_run(particle, pos, k)),
            Term::Group(_) | Term::GroupRef(_) => self.match_repeat(particle, 0, pos, k),
        }
    }

    /// Binding of a child to an element or wildcard term
    fn leaf_binding(&self, term: &Term, name: &QName) -> Option<Binding> {
        match term {
            Term::Element(id) => element_binding(self.grammar, *id, name).map(Binding::Element),
            Term::Any(wildcard) if wildcard.admits(name.namespace.as_deref()) => {
                Some(Binding::Wildcard(wildcard.process_contents))
            }
            _ => None,
        }
    }

    /// Match a repeated element or wildcard: take the longest run of
    /// matching children, then give occurrences back one at a time
    fn match_run(
        &mut self,
        particle: &'a Particle,
        pos: usize,
        k: &mut Continuation<'_, 'a>,
    ) -> bool {
        let occurs = particle.occurs;
        let available = self.children.len() - pos;
        let limit = pos + occurs.max.map_or(available, |max| (max as usize).min(available));
        let mut end = pos;
        while end < limit {
            match self.leaf_binding(&particle.term, self.children[end]) {
                Some(binding) => {
                    self.bindings[end] = Some(binding);
                    end += 1;
                }
                None => break,
            }
        }

        let shortest = pos + occurs.min as usize;
        while end >= shortest {
            if !self.tick() {
                return false;
            }
            if k(self, end) {
                return true;
            }
            if self.exhausted || end == pos {
                return false;
            }
            end -= 1;
        }
        false
    }

    /// Match further occurrences of a group particle after `count` of them
    fn match_repeat(
        &mut self,
        particle: &'a Particle,
        count: u32,
        pos: usize,
        k: &mut Continuation<'_, 'a>,
    ) -> bool {
        if !self.tick() {
            return false;
        }
        self.nested(|m| m.match_repeat_at(particle, count, pos, k))
    }

    fn match_repeat_at(
        &mut self,
        particle: &'a Particle,
        count: u32,
        pos: usize,
        k: &mut Continuation<'_, 'a>,
    ) -> bool {
        let occurs = particle.occurs;
        if occurs.max.map_or(true, |max| count < max) {
            let matched = self.match_term(&particle.term, pos, &mut |m, next| {
                if next == pos {
                    // An empty occurrence stands in for all remaining ones
                    return count < occurs.min && k(m, pos);
                }
                m.match_repeat(particle, count + 1, next, &mut *k)
            });
            if matched {
                return true;
            }
            if self.exhausted {
                return false;
            }
        }
        count >= occurs.min && k(self, pos)
    }

    fn match_term(&mut self, term: &'a Term, pos: usize, k: &mut Continuation<'_, 'a>) -> bool {
        let grammar = self.grammar;
        match term {
            Term::Element(id) => {
                let Some(name) = self.children.get(pos) else {
                    return false;
                };
                match element_binding(grammar, *id, name) {
                    Some(bound) => {
                        self.bindings[pos] = Some(Binding::Element(bound));
                        k(self, pos + 1)
                    }
                    None => false,
                }
            }
            Term::Any(wildcard) => self.match_wildcard(wildcard, pos, k),
            Term::Group(group) => self.match_group(group, pos, k),
            Term::GroupRef(id) => self.match_group(&grammar.group(*id).group, pos, k),
        }
    }

    fn match_wildcard(
        &mut self,
        wildcard: &'a Wildcard,
        pos: usize,
        k: &mut Continuation<'_, 'a>,
    ) -> bool {
        match self.children.get(pos) {
            Some(name) if wildcard.admits(name.namespace.as_deref()) => {
                self.bindings[pos] = Some(Binding::Wildcard(wildcard.process_contents));
                k(self, pos + 1)
            }
            _ => false,
        }
    }

    fn match_group(
        &mut self,
        group: &'a ModelGroup,
        pos: usize,
        k: &mut Continuation<'_, 'a>,
    ) -> bool {
        match group.compositor {
            Compositor::Sequence => self.match_sequence(&group.particles, 0, pos, k),
            Compositor::Choice => {
                for particle in &group.particles {
                    if self.match_particle(particle, pos, k) {
                        return true;
                    }
                    if self.exhausted {
                        return false;
                    }
                }
                false
            }
            Compositor::All => {
                let used = vec![false; group.particles.len()];
                self.match_all(&group.particles, &used, pos, k)
            }
        }
    }

    fn match_sequence(
        &mut self,
        particles: &'a [Particle],
        index: usize,
        pos: usize,
        k: &mut Continuation<'_, 'a>,
    ) -> bool {
        match particles.get(index) {
            None => k(self, pos),
            Some(particle) => self.match_particle(particle, pos, &mut |m, next| {
                m.match_sequence(particles, index + 1, next, &mut *k)
            }),
        }
    }

    fn match_all(
        &mut self,
        particles: &'a [Particle],
        used: &[bool],
        pos: usize,
        k: &mut Continuation<'_, 'a>,
    ) -> bool {
        if !self.tick() {
            return false;
        }
        self.nested(|m| m.match_all_at(particles, used, pos, k))
    }

    fn match_all_at(
        &mut self,
        particles: &'a [Particle],
        used: &[bool],
        pos: usize,
        k: &mut Continuation<'_, 'a>,
    ) -> bool {
        if pos < self.children.len() {
            for (index, particle) in particles.iter().enumerate() {
                if used[index] || particle.occurs.max == Some(0) {
                    continue;
                }
                let mut next_used = used.to_vec();
                next_used[index] = true;
                let matched = self.match_term(&particle.term, pos, &mut |m, next| {
                    next > pos && m.match_all(particles, &next_used, next, &mut *k)
                });
                if matched {
                    return true;
                }
                if self.exhausted {
                    return false;
                }
            }
        }
        let complete = particles
            .iter()
            .zip(used)
            .all(|(particle, used)| *used || nullable_particle(self.grammar, particle));
        complete && k(self, pos)
    }
}

/// Greedy walk explaining why children do not match
struct GreedyVisitor<'a> {
    grammar: &'a Grammar,
    children: &'a [&'a QName],
    pos: usize,
    bindings: Vec<Option<Binding>>,
    errors: Vec<String>,
    /// Element names mentioned anywhere in the model
    known: Vec<&'a QName>,
    /// Wildcards anywhere in the model
    wildcards: Vec<&'a Wildcard>,
}

impl<'a> GreedyVisitor<'a> {
    fn new(grammar: &'a Grammar, particle: &'a Particle, children: &'a [&'a QName]) -> Self {
        let mut visitor = Self {
            grammar,
            children,
            pos: 0,
            bindings: vec![None; children.len()],
            errors: Vec::new(),
            known: Vec::new(),
            wildcards: Vec::new(),
        };
        visitor.collect_names(&particle.term);
        visitor
    }

    fn collect_names(&mut self, term: &'a Term) {
        let grammar = self.grammar;
        match term {
            Term::Element(id) => {
                let declaration = grammar.element(*id);
                self.known.push(&declaration.name);
                for member in &declaration.substitutes {
                    self.known.push(&grammar.element(*member).name);
                }
            }
            Term::Any(wildcard) => self.wildcards.push(wildcard),
            Term::Group(group) => {
                for particle in &group.particles {
                    self.collect_names(&particle.term);
                }
            }
            Term::GroupRef(id) => {
                for particle in &grammar.group(*id).group.particles {
                    self.collect_names(&particle.term);
                }
            }
        }
    }

    fn mentioned(&self, name: &QName) -> bool {
        self.known.iter().any(|known| *known == name)
            || self
                .wildcards
                .iter()
                .any(|w| w.admits(name.namespace.as_deref()))
    }

    /// Report and step over children the model never mentions
    fn skip_unknown(&mut self) {
        while let Some(name) = self.children.get(self.pos) {
            if self.mentioned(name) {
                break;
            }
            self.errors.push(format!("unexpected element {}", name));
            self.pos += 1;
        }
    }

    fn next_starts(&self, term: &Term) -> bool {
        self.children
            .get(self.pos)
            .map_or(false, |name| starts_term(self.grammar, term, name))
    }

    fn report_missing(&mut self, term: &Term) {
        let mut names = Vec::new();
        first_names(self.grammar, term, &mut names);
        let message = match names.as_slice() {
            [single] => format!("missing required element {}", single),
            _ => format!(
                "missing required element, expected one of: {}",
                names.join(", ")
            ),
        };
        self.errors.push(message);
    }

    fn walk_particle(&mut self, particle: &'a Particle) {
        let mut count = 0;
        while particle.occurs.max.map_or(true, |max| count < max) {
            self.skip_unknown();
            if !self.next_starts(&particle.term) {
                if count < particle.occurs.min && !nullable_term(self.grammar, &particle.term) {
                    self.report_missing(&particle.term);
                }
                break;
            }
            let start = self.pos;
            self.walk_term(&particle.term);
            count += 1;
            if self.pos == start {
                break;
            }
        }
    }

    fn walk_term(&mut self, term: &'a Term) {
        let grammar = self.grammar;
        match term {
            Term::Element(id) => {
                let bound = self
                    .children
                    .get(self.pos)
                    .and_then(|name| element_binding(grammar, *id, name));
                if let Some(bound) = bound {
                    self.bindings[self.pos] = Some(Binding::Element(bound));
                    self.pos += 1;
                }
            }
            Term::Any(wildcard) => {
                if self.next_starts(term) {
                    self.bindings[self.pos] = Some(Binding::Wildcard(wildcard.process_contents));
                    self.pos += 1;
                }
            }
            Term::Group(group) => self.walk_group(group),
            Term::GroupRef(id) => self.walk_group(&grammar.group(*id).group),
        }
    }

    fn walk_group(&mut self, group: &'a ModelGroup) {
        match group.compositor {
            Compositor::Sequence => {
                for particle in &group.particles {
                    self.walk_particle(particle);
                }
            }
            Compositor::Choice => {
                self.skip_unknown();
                let branch = group
                    .particles
                    .iter()
                    .find(|p| p.occurs.max != Some(0) && self.next_starts(&p.term));
                if let Some(branch) = branch {
                    self.walk_particle(branch);
                }
            }
            Compositor::All => {
                let mut used = vec![false; group.particles.len()];
                loop {
                    self.skip_unknown();
                    let next = group.particles.iter().enumerate().find(|(index, p)| {
                        !used[*index] && p.occurs.max != Some(0) && self.next_starts(&p.term)
                    });
                    let Some((index, particle)) = next else {
                        break;
                    };
                    used[index] = true;
                    self.walk_particle(particle);
                }
                for (particle, used) in group.particles.iter().zip(used) {
                    if !used && !nullable_particle(self.grammar, particle) {
                        self.report_missing(&particle.term);
                    }
                }
            }
        }
    }

    /// Report the first child left over after the model is exhausted
    fn finish(&mut self) {
        if let Some(name) = self.children.get(self.pos) {
            self.errors.push(format!("unexpected element {}", name));
        }
    }
}
