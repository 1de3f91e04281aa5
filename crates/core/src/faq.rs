//! Frequently asked questions shown on the help page.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaqEntry {
    pub question: &'static str,
    pub answer: &'static str,
}

const ENTRIES: &[FaqEntry] = &[
    FaqEntry {
        question: "¿Cómo puedo solicitar una receta médica?",
        answer: "Para solicitar una receta, inicia sesión en tu cuenta, ve a 'Solicitar Receta', completa el formulario con tus datos de contacto y selecciona los medicamentos que necesitas. Nuestro equipo procesará tu solicitud y te contactará para coordinar la entrega.",
    },
    FaqEntry {
        question: "¿Cuánto tiempo demora la entrega de medicamentos?",
        answer: "El tiempo de entrega depende de tu ubicación y disponibilidad de los medicamentos. Generalmente, las entregas se realizan dentro de las 24-48 horas hábiles después de procesar tu solicitud.",
    },
    FaqEntry {
        question: "¿Qué métodos de pago aceptan?",
        answer: "Aceptamos efectivo, tarjetas de débito y crédito, y transferencias bancarias. El pago se realiza al momento de la entrega de los medicamentos.",
    },
    FaqEntry {
        question: "¿Cómo solicito un turno médico?",
        answer: "Ve a la sección 'Solicitar Turno', selecciona la especialidad médica que necesitas, tu fecha y horario preferido, y completa el formulario. Nuestro equipo se contactará contigo para confirmar la disponibilidad.",
    },
    FaqEntry {
        question: "¿Trabajan con obra social?",
        answer: "Sí, trabajamos con las principales obras sociales del país incluyendo OSDE, Swiss Medical, Galeno, Medicus, IOMA, PAMI y muchas otras. También atendemos pacientes particulares.",
    },
    FaqEntry {
        question: "¿Puedo modificar o cancelar mi solicitud?",
        answer: "Sí, puedes modificar o cancelar tu solicitud contactándote con nuestro equipo de atención al cliente antes de que sea procesada. Una vez que los medicamentos estén en camino, la modificación puede no ser posible.",
    },
    FaqEntry {
        question: "¿Qué hago si tengo problemas con mi cuenta?",
        answer: "Si tienes problemas para acceder a tu cuenta o necesitas cambiar tu contraseña, ve a la sección 'Configuración'. Si el problema persiste, contacta a nuestro soporte técnico.",
    },
    FaqEntry {
        question: "¿Los medicamentos requieren receta médica?",
        answer: "Algunos medicamentos requieren receta médica válida. Nuestro equipo verificará la documentación necesaria antes de procesar tu solicitud. Si no tienes receta, podemos ayudarte a coordinar una consulta médica.",
    },
    FaqEntry {
        question: "¿Realizan entregas los fines de semana?",
        answer: "Realizamos entregas de lunes a viernes en horario comercial. Para urgencias durante fines de semana, contamos con un servicio especial - contacta a nuestro número de emergencia.",
    },
];

pub fn entries() -> &'static [FaqEntry] {
    ENTRIES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_entry_is_a_question_with_an_answer() {
        assert_eq!(entries().len(), 9);
        for entry in entries() {
            assert!(entry.question.starts_with('¿') && entry.question.ends_with('?'));
            assert!(!entry.answer.is_empty());
        }
    }
}
