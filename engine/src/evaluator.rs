#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub name: String,
    pub value: f32,
}

impl Feature {
    pub fn new(name: impl Into<String>, value: f32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    pub value: f32,
    pub features: Vec<Feature>,
}

impl Evaluation {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            features: Vec::new(),
        }
    }

    pub fn with_features(value: f32, features: Vec<Feature>) -> Self {
        Self { value, features }
    }
}

/// Static estimate of a state's value, used in place of a random rollout.
pub trait Evaluator {
    type State;

    fn evaluate(&self, state: &Self::State, t: usize) -> Evaluation;
}
