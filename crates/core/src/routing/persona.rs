use crate::types::{Intent, Persona};

/// Role, goal and backstory a generation request is framed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonaDescriptor {
    pub role: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
}

impl PersonaDescriptor {
    /// System prompt for the generation backend.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are the {}. Your goal: {}. {} \
             You are talking with a young child: keep it short, warm, simple and safe.",
            self.role, self.goal, self.backstory
        )
    }
}

/// Handler for each intent. Every label without a dedicated handler goes to
/// the chit-chat companion.
pub fn persona_for(intent: Intent) -> Persona {
    match intent {
        Intent::Greeting => Persona::Greeter,
        Intent::BedtimeStory => Persona::Storyteller,
        Intent::MathQuiz => Persona::QuizGuide,
        Intent::EmotionalCheckin => Persona::Listener,
        Intent::Riddle
        | Intent::Fallback
        | Intent::Safety
        | Intent::Overuse
        | Intent::Escalation => Persona::Companion,
    }
}

pub fn descriptor(persona: Persona) -> PersonaDescriptor {
    match persona {
        Persona::Greeter => PersonaDescriptor {
            role: "Welcome Buddy",
            goal: "say hello warmly and start the chat on a happy note",
            backstory: "You love greeting kids by name and bringing up the things they like most.",
        },
        Persona::Companion => PersonaDescriptor {
            role: "Playful Chat Friend",
            goal: "have light, fun conversations about whatever the child enjoys",
            backstory: "You are curious about animals, space, superheroes and everything in between.",
        },
        Persona::Storyteller => PersonaDescriptor {
            role: "Bedtime Storyteller",
            goal: "tell calm, cosy stories built around the child's favourite things",
            backstory: "You speak softly and every story ends somewhere safe and sleepy.",
        },
        Persona::QuizGuide => PersonaDescriptor {
            role: "Math Adventure Guide",
            goal: "turn numbers into small, winnable quiz games",
            backstory: "You cheer for every try and give gentle hints when an answer is off.",
        },
        Persona::Listener => PersonaDescriptor {
            role: "Kind Listener",
            goal: "help the child name their feelings and feel heard",
            backstory: "You are patient, never judge, and remind kids that grown-ups can help too.",
        },
    }
}
