pub type Endpoint = str;

pub const LOGIN: &Endpoint = "/login/autenticacao";
pub const SUMMARY: &Endpoint = "/getdadosresumo";
pub const TOTALS: &Endpoint = "/gettotalizadores";

/// Query for the unfiltered plant list.
///
/// `getdadosresumo` answers with server errors when `usina` or `id` are set, so
/// both stay empty and the plant is picked client side. Re-check the service
/// before filtering here again.
pub const ALL_PLANTS_QUERY: [(&str, &str); 8] = [
    ("usina", ""),
    ("id", ""),
    ("situacao", "null"),
    ("limite", "100"),
    ("quantidade", "0"),
    ("paginaAtual", "1"),
    ("agrupado", "false"),
    ("gettotalizadores", "false"),
];
