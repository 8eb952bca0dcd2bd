// Animation script loader: parses the text body of <Action> elements into actions

use super::actor::Actor;
use super::dimension::DimensionParser;
use crate::utils;
use thiserror::Error;

/// Error type for animation script parsing
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Line {line}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

/// A parsed script instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    MoveTo { x: f32, y: f32, duration: f32 },
    MoveBy { dx: f32, dy: f32, duration: f32 },
    Alpha { value: f32, duration: f32 },
    Delay(f32),
    Parallel(Vec<Instruction>),
    /// `count` of None repeats forever
    Repeat { count: Option<u32>, body: Vec<Instruction> },
}

/// Result of loading a script: a reusable instruction list
#[derive(Debug, Clone, PartialEq)]
pub struct AnimScript {
    pub instructions: Vec<Instruction>,
}

impl AnimScript {
    /// Creates a fresh runnable action from this script
    pub fn create_action(&self) -> Action {
        Action {
            root: Node::sequence(&self.instructions),
        }
    }
}

enum Block {
    Parallel,
    Repeat(Option<u32>),
}

/// Parses a script. Positions go through `dimension_parser`, so grid units
/// work inside scripts as well.
///
/// ```text
/// alpha 0
/// parallel
///     moveBy 0 -2g 0.5
///     alpha 1 0.5
/// end
/// ```
pub fn load(source: &str, dimension_parser: &DimensionParser) -> Result<AnimScript, ScriptError> {
    // Each open block keeps its kind and the instructions collected so far
    let mut stack: Vec<(Block, Vec<Instruction>, usize)> = Vec::new();
    let mut top: Vec<Instruction> = Vec::new();

    for (line_index, raw_line) in source.lines().enumerate() {
        let line = line_index + 1;
        let content = raw_line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = content.split_whitespace().collect();
        let error = |message: String| ScriptError { line, message };
        let dimension = |token: &str| {
            dimension_parser
                .parse(token)
                .map_err(|e| ScriptError { line, message: e.to_string() })
        };
        let number = |token: &str| {
            token
                .parse::<f32>()
                .map_err(|_| ScriptError { line, message: format!("Invalid number '{}'", token) })
        };
        let optional_duration = |index: usize| -> Result<f32, ScriptError> {
            match tokens.get(index) {
                Some(token) => number(token),
                None => Ok(0.0),
            }
        };
        let current = match stack.last_mut() {
            Some((_, instructions, _)) => instructions,
            None => &mut top,
        };

        match tokens[0] {
            "moveTo" | "moveBy" => {
                if !(3..=4).contains(&tokens.len()) {
                    return Err(error(format!("{} expects 2 or 3 arguments", tokens[0])));
                }
                let x = dimension(tokens[1])?;
                let y = dimension(tokens[2])?;
                let duration = optional_duration(3)?;
                current.push(if tokens[0] == "moveTo" {
                    Instruction::MoveTo { x, y, duration }
                } else {
                    Instruction::MoveBy { dx: x, dy: y, duration }
                });
            }
            "alpha" => {
                if !(2..=3).contains(&tokens.len()) {
                    return Err(error("alpha expects 1 or 2 arguments".to_string()));
                }
                let value = number(tokens[1])?;
                let duration = optional_duration(2)?;
                current.push(Instruction::Alpha { value, duration });
            }
            "delay" => {
                if tokens.len() != 2 {
                    return Err(error("delay expects 1 argument".to_string()));
                }
                current.push(Instruction::Delay(number(tokens[1])?));
            }
            "parallel" => {
                if tokens.len() != 1 {
                    return Err(error("parallel takes no argument".to_string()));
                }
                stack.push((Block::Parallel, Vec::new(), line));
            }
            "repeat" => {
                let count = match tokens.len() {
                    1 => None,
                    2 => Some(
                        tokens[1]
                            .parse::<u32>()
                            .map_err(|_| error(format!("Invalid repeat count '{}'", tokens[1])))?,
                    ),
                    _ => return Err(error("repeat expects at most 1 argument".to_string())),
                };
                stack.push((Block::Repeat(count), Vec::new(), line));
            }
            "end" => {
                let (block, body, _) = stack
                    .pop()
                    .ok_or_else(|| error("'end' without an open block".to_string()))?;
                let instruction = match block {
                    Block::Parallel => Instruction::Parallel(body),
                    Block::Repeat(count) => Instruction::Repeat { count, body },
                };
                match stack.last_mut() {
                    Some((_, instructions, _)) => instructions.push(instruction),
                    None => top.push(instruction),
                }
            }
            other => return Err(error(format!("Unknown instruction '{}'", other))),
        }
    }

    if let Some((_, _, line)) = stack.last() {
        return Err(ScriptError {
            line: *line,
            message: "Block is never closed".to_string(),
        });
    }
    Ok(AnimScript { instructions: top })
}

/// A running script attached to an actor
pub struct Action {
    root: Node,
}

impl Action {
    /// Advances the action; returns true once it has finished
    pub fn act(&mut self, actor: &mut Actor, delta: f32) -> bool {
        self.root.act(actor, delta)
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Action")
    }
}

enum TweenKind {
    MoveTo(f32, f32),
    MoveBy(f32, f32),
    Alpha(f32),
    Delay,
}

enum Node {
    Tween {
        kind: TweenKind,
        duration: f32,
        elapsed: f32,
        start: Option<(f32, f32)>,
    },
    Sequence {
        nodes: Vec<Node>,
        index: usize,
    },
    Parallel(Vec<(Node, bool)>),
    Repeat {
        body: Vec<Instruction>,
        remaining: Option<u32>,
        current: Box<Node>,
    },
}

impl Node {
    fn sequence(instructions: &[Instruction]) -> Node {
        Node::Sequence {
            nodes: instructions.iter().map(Node::from_instruction).collect(),
            index: 0,
        }
    }

    fn tween(kind: TweenKind, duration: f32) -> Node {
        Node::Tween {
            kind,
            duration,
            elapsed: 0.0,
            start: None,
        }
    }

    fn from_instruction(instruction: &Instruction) -> Node {
        match instruction {
            Instruction::MoveTo { x, y, duration } => Node::tween(TweenKind::MoveTo(*x, *y), *duration),
            Instruction::MoveBy { dx, dy, duration } => Node::tween(TweenKind::MoveBy(*dx, *dy), *duration),
            Instruction::Alpha { value, duration } => Node::tween(TweenKind::Alpha(*value), *duration),
            Instruction::Delay(duration) => Node::tween(TweenKind::Delay, *duration),
            Instruction::Parallel(body) => {
                Node::Parallel(body.iter().map(|i| (Node::from_instruction(i), false)).collect())
            }
            Instruction::Repeat { count, body } => Node::Repeat {
                body: body.clone(),
                remaining: *count,
                current: Box::new(Node::sequence(body)),
            },
        }
    }

    fn act(&mut self, actor: &mut Actor, delta: f32) -> bool {
        match self {
            Node::Tween {
                kind,
                duration,
                elapsed,
                start,
            } => {
                let (start_a, start_b) = *start.get_or_insert_with(|| match kind {
                    TweenKind::Alpha(_) => (actor.color.a, 0.0),
                    _ => (actor.x, actor.y),
                });
                *elapsed += delta;
                let t = if *duration <= 0.0 {
                    1.0
                } else {
                    (*elapsed / *duration).min(1.0)
                };
                match kind {
                    TweenKind::MoveTo(x, y) => {
                        actor.x = utils::lerp(start_a, *x, t);
                        actor.y = utils::lerp(start_b, *y, t);
                    }
                    TweenKind::MoveBy(dx, dy) => {
                        actor.x = start_a + *dx * t;
                        actor.y = start_b + *dy * t;
                    }
                    TweenKind::Alpha(value) => actor.color.a = utils::lerp(start_a, *value, t),
                    TweenKind::Delay => {}
                }
                t >= 1.0
            }
            Node::Sequence { nodes, index } => {
                let mut delta = delta;
                while *index < nodes.len() {
                    if !nodes[*index].act(actor, delta) {
                        return false;
                    }
                    *index += 1;
                    // Time is not carried over to the next instruction
                    delta = 0.0;
                }
                true
            }
            Node::Parallel(nodes) => {
                let mut all_done = true;
                for (node, done) in nodes.iter_mut() {
                    if !*done {
                        *done = node.act(actor, delta);
                    }
                    all_done &= *done;
                }
                all_done
            }
            Node::Repeat {
                body,
                remaining,
                current,
            } => {
                if !current.act(actor, delta) {
                    return false;
                }
                if let Some(count) = remaining {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        return true;
                    }
                }
                **current = Node::sequence(body);
                false
            }
        }
    }
}
