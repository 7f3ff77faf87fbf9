/// Something the upstream can tell apart from another client: a user agent,
/// an InnerTube client context, and so on.
pub trait Identity {
    fn label(&self) -> &str;
}

/// Ordered list of identity profiles to try when the upstream rejects a
/// request shape. Shared by the relay and by strategies that cycle clients.
#[derive(Debug, Clone)]
pub struct IdentityRotation<P> {
    profiles: Vec<P>,
}

impl<P: Identity> IdentityRotation<P> {
    pub fn new(profiles: Vec<P>) -> Self {
        Self { profiles }
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn profiles(&self) -> &[P] {
        &self.profiles
    }

    /// Attempt order: the profile labelled `preferred` first (when present),
    /// then every other profile in configured order.
    pub fn sequence(&self, preferred: Option<&str>) -> Vec<&P> {
        let mut order: Vec<&P> = Vec::with_capacity(self.profiles.len());

        if let Some(wanted) = preferred {
            if let Some(p) = self
                .profiles
                .iter()
                .find(|p| p.label().eq_ignore_ascii_case(wanted))
            {
                order.push(p);
            }
        }

        for p in &self.profiles {
            if !order.iter().any(|o| std::ptr::eq(*o, p)) {
                order.push(p);
            }
        }
        order
    }
}
