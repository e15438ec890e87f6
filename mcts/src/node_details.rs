use std::fmt::{self, Debug, Display, Formatter};

pub struct NodeDetails<A> {
    pub visits: u32,
    pub children: Vec<(A, EdgeDetails)>,
}

impl<A: Display> Display for NodeDetails<A> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let actions = format!(
            "[{}]",
            self.children
                .iter()
                .fold(String::new(), |acc, (a, details)| acc
                    + &format!("\n\t(A: {}, {}),", a, details))
        );

        write!(
            f,
            "V: {visits}, Actions: {actions}",
            visits = self.visits,
            actions = actions
        )
    }
}

impl<A: Debug + Display> Debug for NodeDetails<A> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Display::fmt(self, f)
    }
}

#[derive(PartialEq)]
#[allow(non_snake_case)]
pub struct EdgeDetails {
    pub Nsa: u32,
    pub Wsa: f32,
    pub Qsa: f32,
    pub Usa: f32,
    pub c: f32,
    pub UCB: f32,
}

impl Display for EdgeDetails {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "Nsa: {Nsa}, Wsa: {Wsa:.3}, Qsa: {Qsa:.3}, Usa: {Usa:.3}, c: {c:.2}, UCB: {UCB:.3}",
            Nsa = self.Nsa,
            Wsa = self.Wsa,
            Qsa = self.Qsa,
            Usa = self.Usa,
            c = self.c,
            UCB = self.UCB,
        )
    }
}

impl Debug for EdgeDetails {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(visits: u32, score: f32, ucb: f32) -> EdgeDetails {
        EdgeDetails {
            Nsa: visits,
            Wsa: score,
            Qsa: score / visits as f32,
            Usa: 1.0,
            c: 1.0,
            UCB: ucb,
        }
    }

    #[test]
    fn test_display() {
        let node = NodeDetails {
            visits: 3,
            children: vec![(1, details(2, 1.0, 0.5))],
        };

        let text = node.to_string();
        assert!(text.starts_with("V: 3, Actions: ["));
        assert!(text.contains("(A: 1, Nsa: 2, Wsa: 1.000"));
    }
}
