//! Word lists for the Spanish lexicon tagger and the grammar rules.
//!
//! Lookups take normalized (lowercase) words. Content-word lists hold the
//! singular, masculine form where one exists; `fold` derives the forms a
//! plural or feminine word may be listed under.

use serde::{Deserialize, Serialize};

use crate::types::WordCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Masculine,
    Feminine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Number {
    Singular,
    Plural,
}

/// Grammatical features of a determiner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Determiner {
    pub gender: Gender,
    pub number: Number,
    /// Which paradigm the determiner belongs to, for suggesting a replacement.
    pub paradigm: Paradigm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paradigm {
    Definite,
    Indefinite,
    Proximal,
    Medial,
    Distal,
}

use Gender::{Feminine as F, Masculine as M};
use Number::{Plural as P, Singular as S};
use Paradigm::*;

const DETERMINERS: &[(&str, Gender, Number, Paradigm)] = &[
    ("el", M, S, Definite),
    ("la", F, S, Definite),
    ("los", M, P, Definite),
    ("las", F, P, Definite),
    ("un", M, S, Indefinite),
    ("una", F, S, Indefinite),
    ("unos", M, P, Indefinite),
    ("unas", F, P, Indefinite),
    ("este", M, S, Proximal),
    ("esta", F, S, Proximal),
    ("estos", M, P, Proximal),
    ("estas", F, P, Proximal),
    ("ese", M, S, Medial),
    ("esa", F, S, Medial),
    ("esos", M, P, Medial),
    ("esas", F, P, Medial),
    ("aquel", M, S, Distal),
    ("aquella", F, S, Distal),
    ("aquellos", M, P, Distal),
    ("aquellas", F, P, Distal),
];

const FUNCTION_WORDS: &[&str] = &[
    // prepositions and contractions
    "a", "al", "ante", "bajo", "con", "contra", "de", "del", "desde", "durante", "en", "entre",
    "hacia", "hasta", "mediante", "para", "por", "según", "sin", "sobre", "tras",
    // conjunctions
    "y", "e", "o", "u", "ni", "pero", "sino", "que", "porque", "aunque", "si", "como", "cuando",
    "mientras", "pues",
    // pronouns and possessives
    "yo", "tú", "él", "ella", "ello", "nosotros", "nosotras", "vosotros", "vosotras", "ellos",
    "ellas", "usted", "ustedes", "me", "te", "se", "nos", "os", "lo", "le", "les", "mi", "mis",
    "tu", "tus", "su", "sus", "nuestro", "nuestra", "nuestros", "nuestras", "esto", "eso",
    "aquello", "algo", "nada", "nadie", "alguien", "qué", "quién", "quiénes", "cuál", "cuáles",
    "dónde", "cuándo", "cómo", "cuánto", "cuánta", "cuántos", "cuántas", "algún", "alguno",
    "alguna", "algunos", "algunas", "ningún", "ninguno", "ninguna", "todo", "toda", "todos",
    "todas", "otro", "otra", "otros", "otras", "mucho", "mucha", "muchos", "muchas", "poco",
    "poca", "pocos", "pocas", "cada",
];

const ADVERBS: &[&str] = &[
    "no", "sí", "muy", "más", "menos", "bien", "mal", "siempre", "nunca", "también", "tampoco",
    "ya", "aquí", "allí", "ahí", "hoy", "ayer", "mañana", "ahora", "luego", "después", "antes",
    "pronto", "tarde", "temprano", "casi", "solo", "todavía", "aún", "bastante", "demasiado",
    "así", "cerca", "lejos", "dentro", "fuera", "despacio",
];

const NOUNS: &[&str] = &[
    "niño", "hombre", "mujer", "padre", "madre", "hermano", "hijo", "abuelo", "amigo", "vecino",
    "profesor", "maestro", "estudiante", "alumno", "médico", "perro", "gato", "pájaro", "caballo",
    "pez", "manzana", "naranja", "pan", "leche", "queso", "fruta", "comida", "agua", "café",
    "casa", "escuela", "ciudad", "país", "pueblo", "calle", "parque", "jardín", "playa", "mar",
    "río", "montaña", "campo", "bosque", "árbol", "flor", "sol", "luna", "cielo", "libro",
    "mesa", "silla", "cama", "puerta", "ventana", "coche", "tren", "avión", "bicicleta", "pelota",
    "juego", "música", "canción", "carta", "papel", "lápiz", "cuaderno", "palabra", "texto",
    "historia", "cuento", "clase", "examen", "día", "noche", "tarde", "tiempo", "año", "mes",
    "semana", "hora", "vida", "mundo", "trabajo", "familia", "ojo", "cabeza", "mano", "pie",
    "corazón", "foto", "moto", "radio", "idioma", "tema", "mapa", "problema", "sistema",
    "programa", "clima", "planeta", "lunes", "martes", "miércoles", "jueves", "viernes",
    "crisis", "análisis", "virus", "paraguas", "cumpleaños", "águila", "alma", "hacha", "área",
    "arma", "aula", "hambre", "ala", "tienda", "mercado", "dinero", "color", "animal", "verano",
    "invierno", "camino", "viaje", "idea", "pregunta", "respuesta",
];

const ADJECTIVES: &[&str] = &[
    "rojo", "azul", "verde", "blanco", "negro", "amarillo", "gris", "grande", "pequeño", "bueno",
    "malo", "nuevo", "viejo", "joven", "alto", "largo", "corto", "bonito", "feo", "feliz",
    "triste", "contento", "cansado", "rápido", "lento", "fácil", "difícil", "importante",
    "mejor", "peor", "primero", "último", "caliente", "frío", "dulce", "rico", "pobre", "limpio",
    "sucio", "tranquilo", "simpático", "inteligente", "fuerte", "débil", "lleno", "vacío",
];

const VERBS: &[&str] = &[
    "ser", "estar", "tener", "haber", "hacer", "ir", "comer", "beber", "vivir", "leer",
    "escribir", "hablar", "jugar", "correr", "ver", "mirar", "decir", "poder", "querer", "saber",
    "dar", "llegar", "pasar", "deber", "poner", "parecer", "quedar", "creer", "llevar", "dejar",
    "seguir", "encontrar", "llamar", "venir", "pensar", "salir", "volver", "tomar", "conocer",
    "sentir", "trabajar", "estudiar", "caminar", "cantar", "bailar", "abrir", "cerrar", "coger",
    "comprar", "cocinar", "dormir", "nadar", "viajar",
    // frequent finite forms
    "es", "son", "era", "eran", "fue", "fueron", "soy", "eres", "somos", "está", "están",
    "estoy", "estás", "estamos", "estaba", "tiene", "tienen", "tengo", "tienes", "tenemos",
    "hace", "hacen", "hago", "va", "van", "voy", "vas", "vamos", "come", "comen", "comemos",
    "bebe", "beben", "vive", "viven", "vivo", "lee", "leen", "leo", "escribe", "escriben",
    "habla", "hablan", "hablo", "juega", "juegan", "corre", "corren", "ve", "ven", "mira",
    "miran", "dice", "dicen", "dijo", "puede", "pueden", "quiere", "quieren", "sabe", "saben",
    "da", "dan", "hay", "ha", "han", "he", "había", "haya", "llega", "llegan", "hizo", "tuvo",
    "canta", "cantan", "estudia", "estudian", "trabaja", "trabajan", "camina", "caminan",
    "abre", "cierra", "sale", "vuelve", "toma", "conoce", "piensa", "siente", "lleva", "compra",
    "cocina", "duerme", "nada", "viaja", "dijiste", "fuiste", "coge",
];

const MASCULINE_A: &[&str] = &[
    "día", "mapa", "problema", "sistema", "tema", "programa", "idioma", "clima", "planeta",
    "poema", "sofá",
];

const FEMININE_O: &[&str] = &["mano", "foto", "moto", "radio"];

/// Feminine nouns that take `el`/`un` in the singular.
const STRESSED_A: &[&str] = &[
    "agua", "águila", "alma", "hacha", "área", "arma", "aula", "hambre", "ala",
];

const INVARIANT_NUMBER: &[&str] = &[
    "lunes", "martes", "miércoles", "jueves", "viernes", "crisis", "análisis", "virus",
    "paraguas", "cumpleaños", "tesis",
];

const MISSPELLINGS: &[(&str, &str)] = &[
    ("haiga", "haya"),
    ("nadies", "nadie"),
    ("dijistes", "dijiste"),
    ("fuistes", "fuiste"),
    ("cojer", "coger"),
    ("q", "que"),
    ("xq", "porque"),
    ("pq", "porque"),
    ("tmb", "también"),
    ("bn", "bien"),
    ("x", "por"),
    ("k", "que"),
    ("aver", "a ver"),
    ("enserio", "en serio"),
    ("osea", "o sea"),
    ("ahun", "aún"),
];

/// Unaccented forms that need a diacritic accent in some uses.
const DIACRITIC_ACCENTS: &[(&str, &str)] = &[("mas", "más"), ("tu", "tú"), ("el", "él"), ("si", "sí")];

/// Answers graded as interchangeable, written accent-folded.
const SYNONYM_GROUPS: &[&[&str]] = &[
    &["si", "cierto", "verdadero", "correcto", "afirmativo"],
    &["no", "falso", "incorrecto", "negativo", "erroneo"],
    &["grande", "enorme", "gigante", "inmenso", "colosal", "vasto"],
    &["pequeno", "diminuto", "minusculo", "chico", "reducido"],
    &["rapido", "veloz", "agil", "ligero"],
    &["lento", "pausado", "despacio"],
];

/// Candidate dictionary forms of a word: itself, then plural-stripped,
/// then with feminine `-a` swapped for `-o`.
pub fn fold(word: &str) -> Vec<String> {
    let mut forms = vec![word.to_string()];
    if let Some(stem) = word.strip_suffix("es") {
        if !stem.is_empty() {
            forms.push(stem.to_string());
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        if !stem.is_empty() {
            forms.push(stem.to_string());
        }
    }
    let gendered: Vec<String> = forms
        .iter()
        .filter_map(|f| f.strip_suffix('a').map(|stem| format!("{stem}o")))
        .collect();
    forms.extend(gendered);
    forms
}

/// Category from the closed lists, folding inflected content words.
pub fn lookup(word: &str) -> Option<WordCategory> {
    if DETERMINERS.iter().any(|(d, ..)| *d == word) || FUNCTION_WORDS.contains(&word) {
        return Some(WordCategory::FunctionWord);
    }
    if ADVERBS.contains(&word) {
        return Some(WordCategory::Adverb);
    }
    if VERBS.contains(&word) {
        return Some(WordCategory::Verb);
    }
    for form in fold(word) {
        let form = form.as_str();
        if NOUNS.contains(&form) {
            return Some(WordCategory::Noun);
        }
        if ADJECTIVES.contains(&form) {
            return Some(WordCategory::Adjective);
        }
        if VERBS.contains(&form) {
            return Some(WordCategory::Verb);
        }
    }
    None
}

/// Whether the word belongs to the everyday vocabulary.
pub fn is_common(word: &str) -> bool {
    lookup(word).is_some()
}

pub fn determiner(word: &str) -> Option<Determiner> {
    DETERMINERS
        .iter()
        .find(|(d, ..)| *d == word)
        .map(|&(_, gender, number, paradigm)| Determiner {
            gender,
            number,
            paradigm,
        })
}

/// Determiner of `paradigm` agreeing with the given gender and number.
pub fn determiner_for(paradigm: Paradigm, gender: Gender, number: Number) -> &'static str {
    DETERMINERS
        .iter()
        .find(|&&(_, g, n, p)| p == paradigm && g == gender && n == number)
        .map(|(d, ..)| *d)
        .unwrap_or("el")
}

/// Agreement features of a noun, as far as the word form reveals them.
///
/// Returns `None` for a component the form leaves open (invariant plurals,
/// nouns with unmarked endings).
pub fn noun_features(noun: &str) -> (Option<Gender>, Option<Number>) {
    let number = if INVARIANT_NUMBER.contains(&noun) {
        None
    } else if noun.ends_with('s') {
        Some(Number::Plural)
    } else {
        Some(Number::Singular)
    };

    let singular = match number {
        Some(Number::Plural) => fold(noun)
            .into_iter()
            .skip(1)
            .find(|f| NOUNS.contains(&f.as_str()) && !f.ends_with('s'))
            .unwrap_or_else(|| noun.trim_end_matches('s').to_string()),
        _ => noun.to_string(),
    };

    let gender = if MASCULINE_A.contains(&singular.as_str()) {
        Some(Gender::Masculine)
    } else if FEMININE_O.contains(&singular.as_str()) || STRESSED_A.contains(&singular.as_str()) {
        Some(Gender::Feminine)
    } else if singular.ends_with('o') {
        Some(Gender::Masculine)
    } else if singular.ends_with('a')
        || ["ción", "sión", "dad", "tad", "tud", "umbre"]
            .iter()
            .any(|s| singular.ends_with(s))
    {
        Some(Gender::Feminine)
    } else {
        None
    };

    (gender, number)
}

/// Feminine singular noun that takes a masculine article (`el agua`).
pub fn takes_masculine_article(noun: &str) -> bool {
    STRESSED_A.contains(&noun)
}

pub fn misspelling(word: &str) -> Option<&'static str> {
    MISSPELLINGS
        .iter()
        .find(|(wrong, _)| *wrong == word)
        .map(|(_, right)| *right)
}

/// Accented form of a diacritic-accent word, e.g. `tu` → `tú`.
pub fn accented(word: &str) -> Option<&'static str> {
    DIACRITIC_ACCENTS
        .iter()
        .find(|(plain, _)| *plain == word)
        .map(|(_, accented)| *accented)
}

/// Number-swapped form of a word ending in a vowel or consonant.
/// Whether two distinct accent-folded answers belong to one synonym group.
pub fn are_synonyms(a: &str, b: &str) -> bool {
    a != b && SYNONYM_GROUPS.iter().any(|group| group.contains(&a) && group.contains(&b))
}

pub fn inflect_number(word: &str, number: Number) -> String {
    match number {
        Number::Plural => {
            if word.ends_with(|c: char| "aeiouáéó".contains(c)) {
                format!("{word}s")
            } else {
                format!("{word}es")
            }
        }
        Number::Singular => fold(word)
            .into_iter()
            .skip(1)
            .find(|f| lookup(f).is_some())
            .unwrap_or_else(|| word.trim_end_matches('s').to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_plural_and_feminine_forms() {
        assert_eq!(lookup("manzanas"), Some(WordCategory::Noun));
        assert_eq!(lookup("rojas"), Some(WordCategory::Adjective));
        assert_eq!(lookup("niña"), Some(WordCategory::Noun));
        assert_eq!(lookup("come"), Some(WordCategory::Verb));
        assert_eq!(lookup("el"), Some(WordCategory::FunctionWord));
        assert_eq!(lookup("epistemología"), None);
    }

    #[test]
    fn noun_features_respect_exceptions() {
        assert_eq!(
            noun_features("manzanas"),
            (Some(Gender::Feminine), Some(Number::Plural))
        );
        assert_eq!(
            noun_features("problema"),
            (Some(Gender::Masculine), Some(Number::Singular))
        );
        assert_eq!(noun_features("mano").0, Some(Gender::Feminine));
        assert_eq!(noun_features("crisis").1, None);
        assert_eq!(noun_features("flores"), (None, Some(Number::Plural)));
    }

    #[test]
    fn suggests_agreeing_determiner() {
        assert_eq!(
            determiner_for(Paradigm::Definite, Gender::Feminine, Number::Plural),
            "las"
        );
        assert_eq!(
            determiner_for(Paradigm::Indefinite, Gender::Masculine, Number::Singular),
            "un"
        );
    }

    #[test]
    fn inflects_number() {
        assert_eq!(inflect_number("manzana", Number::Plural), "manzanas");
        assert_eq!(inflect_number("flor", Number::Plural), "flores");
        assert_eq!(inflect_number("manzanas", Number::Singular), "manzana");
    }
}
